//! Conformance test file parser and runner.
//!
//! Each case is a root module (a single `main.tf`) and the issues the
//! catalog should report against it, one `<rule>: <first message line>` per
//! line, in report order:
//!
//! ```text
//! # test: wrong_default
//! ---
//! variable "kind" {
//!   type    = string
//!   default = "bar"
//! }
//! ---
//! kind: `var.kind`: default value is not correct, see: https://example.com
//! ===
//! ```
//!
//! A `# expect: error` line after the header means checking must fail; the
//! expected section is then a fragment of the error message.

use varlint_kernel::{Catalog, ModulePath, ModuleRunner, Rule, SourceModule};

use crate::{TestResult, TestSummary};

/// A single conformance test case.
#[derive(Debug, Clone)]
pub struct ConformanceCase {
    /// Test name from the `# test: name` line.
    pub name: String,
    /// Line number where the test starts (1-indexed).
    pub line_number: usize,
    /// The module source.
    pub input: String,
    pub expected: Expectation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// Issue lines in report order; empty for a compliant module.
    Issues(Vec<String>),
    /// A fragment of the error that aborts the check.
    Error(String),
}

/// Parse the *.test file format into test cases.
pub fn parse_conformance_tests(content: &str) -> Vec<ConformanceCase> {
    let mut cases = Vec::new();
    let lines: Vec<&str> = content.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let Some(name) = lines[i].trim().strip_prefix("# test:") else {
            i += 1;
            continue;
        };
        let name = name.trim().to_string();
        let start_line = i + 1;
        i += 1;

        let expect_error = match lines.get(i).and_then(|l| l.trim().strip_prefix("# expect:")) {
            Some(expect) => {
                i += 1;
                expect.trim() == "error"
            }
            None => false,
        };

        // Skip to first ---
        while i < lines.len() && lines[i].trim() != "---" {
            i += 1;
        }
        i += 1;

        let mut input_lines = Vec::new();
        while i < lines.len() && lines[i].trim() != "---" {
            input_lines.push(lines[i]);
            i += 1;
        }
        i += 1;

        let mut expected_lines = Vec::new();
        while i < lines.len() && lines[i].trim() != "===" {
            let line = lines[i].trim();
            if !line.is_empty() {
                expected_lines.push(line.to_string());
            }
            i += 1;
        }
        i += 1;

        let mut input = input_lines.join("\n");
        input.push('\n');

        let expected = if expect_error {
            Expectation::Error(expected_lines.join("\n"))
        } else {
            Expectation::Issues(expected_lines)
        };

        cases.push(ConformanceCase {
            name,
            line_number: start_line,
            input,
            expected,
        });
    }

    cases
}

impl ConformanceCase {
    /// Check the case's module with every enabled rule of `catalog`.
    pub fn run(&self, catalog: &Catalog) -> TestResult {
        match self.check(catalog) {
            Ok(actual) => match &self.expected {
                Expectation::Issues(expected) if *expected == actual => TestResult::Pass,
                Expectation::Issues(expected) => TestResult::Fail {
                    expected: expected.join("\n"),
                    actual: actual.join("\n"),
                },
                Expectation::Error(expected) => TestResult::Fail {
                    expected: format!("error: {expected}"),
                    actual: actual.join("\n"),
                },
            },
            Err(message) => match &self.expected {
                Expectation::Error(expected) if message.contains(expected.as_str()) => {
                    TestResult::Pass
                }
                Expectation::Error(expected) => TestResult::Fail {
                    expected: format!("error: {expected}"),
                    actual: format!("error: {message}"),
                },
                Expectation::Issues(_) => TestResult::Error { message },
            },
        }
    }

    fn check(&self, catalog: &Catalog) -> Result<Vec<String>, String> {
        let module = SourceModule::from_sources(ModulePath::root(), [("main.tf", &self.input)])
            .map_err(|e| e.to_string())?;
        let mut runner = ModuleRunner::new(&module);
        for rule in catalog.rules() {
            rule.check(&mut runner).map_err(|e| e.to_string())?;
        }
        Ok(runner
            .into_issues()
            .iter()
            .map(|issue| {
                format!("{}: {}", issue.rule, issue.summary())
                    .trim_end()
                    .to_string()
            })
            .collect())
    }
}

/// Run all conformance cases against `catalog` and return a summary.
pub fn run_conformance_tests(cases: &[ConformanceCase], catalog: &Catalog) -> TestSummary {
    let mut summary = TestSummary::new();

    for case in cases {
        let result = case.run(catalog);
        summary.record(&case.name, case.line_number, result);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_issue_case() {
        let content = r#"
# test: missing_type
---
variable "kind" {
  default = "foo"
}
---
kind: `kind` variable type not declared
===
"#;
        let cases = parse_conformance_tests(content);
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].name, "missing_type");
        assert_eq!(cases[0].line_number, 2);
        assert!(cases[0].input.starts_with("variable \"kind\" {"));
        assert_eq!(
            cases[0].expected,
            Expectation::Issues(vec!["kind: `kind` variable type not declared".to_string()])
        );
    }

    #[test]
    fn parse_clean_and_error_cases() {
        let content = r#"
# test: clean
---
locals {}
---
===

# test: broken
# expect: error
---
variable "kind" {
  type = strng
}
---
invalid type specification
===
"#;
        let cases = parse_conformance_tests(content);
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].expected, Expectation::Issues(vec![]));
        assert_eq!(
            cases[1].expected,
            Expectation::Error("invalid type specification".to_string())
        );
    }

    #[test]
    fn run_against_catalog() {
        let catalog = Catalog::from_toml(
            "[[variable]]\nname = \"kind\"\ntype = \"string\"\ndefault = '\"foo\"'\n",
        )
        .unwrap();
        let cases = parse_conformance_tests(
            r#"
# test: ok
---
variable "kind" {
  type    = string
  default = "foo"
}
---
===

# test: wrong
---
variable "kind" {
  type    = string
  default = "bar"
}
---
kind: `var.kind`: default value is not correct, see:
===
"#,
        );
        let summary = run_conformance_tests(&cases, &catalog);
        assert!(summary.all_passed(), "{summary}");
        assert_eq!(summary.passed, 2);
    }
}
