//! Test utilities for varlint.
//!
//! Provides the parser and runner for the conformance fixture format used in
//! `tests/conformance/*.test`: an HCL module source and the issues the
//! catalog's rules should report against it.

pub mod conformance;

use std::fmt;

/// How one conformance case went.
#[derive(Debug, Clone)]
pub enum TestResult {
    Pass,
    /// The issue lines (or the error) differed from the expectation.
    Fail { expected: String, actual: String },
    /// Checking failed where issues were expected.
    Error { message: String },
}

/// Tally of a conformance run, with every case that did not pass.
#[derive(Debug, Default)]
pub struct TestSummary {
    pub passed: usize,
    pub failures: Vec<TestFailure>,
}

#[derive(Debug, Clone)]
pub struct TestFailure {
    pub name: String,
    pub line: usize,
    pub result: TestResult,
}

impl TestSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: impl Into<String>, line: usize, result: TestResult) {
        if let TestResult::Pass = result {
            self.passed += 1;
            return;
        }
        self.failures.push(TestFailure {
            name: name.into(),
            line,
            result,
        });
    }

    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for TestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "conformance: {} passed, {} failed",
            self.passed,
            self.failures.len()
        )?;
        for failure in &self.failures {
            writeln!(f, "- {} (line {})", failure.name, failure.line)?;
            match &failure.result {
                TestResult::Fail { expected, actual } => {
                    writeln!(f, "  expected:\n{}", indent(expected))?;
                    writeln!(f, "  actual:\n{}", indent(actual))?;
                }
                TestResult::Error { message } => writeln!(f, "  error: {message}")?,
                TestResult::Pass => {}
            }
        }
        Ok(())
    }
}

fn indent(text: &str) -> String {
    if text.is_empty() {
        return "    (no issues)".to_string();
    }
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
