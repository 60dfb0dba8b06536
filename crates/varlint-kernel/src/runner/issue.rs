//! Issues reported by rules, and where they point.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::Span;

/// How serious a reported issue is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Fails the check.
    #[default]
    Error,
    /// Reported but does not fail the check.
    Warning,
    /// Informational.
    Notice,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Notice => write!(f, "notice"),
        }
    }
}

/// A byte range within a named source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRange {
    pub filename: String,
    pub span: Span,
}

impl SourceRange {
    pub fn new(filename: impl Into<String>, span: Span) -> Self {
        Self {
            filename: filename.into(),
            span,
        }
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.span)
    }
}

/// One finding, as recorded by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub range: SourceRange,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub link: String,
}

impl Issue {
    /// The first line of the message, which is the whole message for every
    /// issue except a type mismatch.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}]: {}",
            self.range,
            self.severity,
            self.rule,
            self.summary()
        )
    }
}
