//! The host side of a rule: module content in, issues out.
//!
//! A [`Runner`] is what a rule talks to. It says which module is being
//! inspected, returns that module's content filtered through a schema, and
//! records the issues the rule emits. [`ModuleRunner`] is the in-process
//! implementation over a [`SourceModule`].

mod issue;
mod module;
mod schema;

pub use issue::{Issue, Severity, SourceRange};
pub use module::{LoadError, SourceFile, SourceModule, discover_modules};
pub use schema::{BlockSchema, BodySchema, VARIABLE_BODY_SCHEMA};

use std::fmt;

use tracing::trace;

use crate::ast::{Attribute, Block, Span};
use crate::rule::Rule;

/// Host-side failures surfaced to a rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    /// The module content does not fit the requested schema.
    #[error("{filename}: {message}")]
    Content {
        filename: String,
        span: Span,
        message: String,
    },
    /// The host refused an issue.
    #[error("failed to emit issue: {0}")]
    Emit(String),
}

/// Where a module sits in the module tree.
///
/// The root module has an empty path; a child module's path is its directory
/// relative to the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "root")
        } else {
            write!(f, "{}", self.0.join("/"))
        }
    }
}

/// A block returned by [`Runner::module_content`], tagged with its file.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentBlock {
    pub filename: String,
    pub block: Block,
}

impl ContentBlock {
    /// The first label, which for a variable is its name.
    pub fn label(&self) -> Option<&str> {
        self.block.labels.first().map(String::as_str)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.body.attribute(name)
    }

    /// The block header: `variable "name"`.
    pub fn def_range(&self) -> SourceRange {
        self.range(self.block.def_span)
    }

    pub fn range(&self, span: Span) -> SourceRange {
        SourceRange::new(self.filename.clone(), span)
    }
}

/// What a rule needs from the host.
pub trait Runner {
    /// Path of the module under inspection.
    fn module_path(&self) -> Result<ModulePath, HostError>;

    /// Top-level blocks of every file in the module, filtered by `schema`,
    /// in file order then source order.
    fn module_content(&self, schema: &BodySchema) -> Result<Vec<ContentBlock>, HostError>;

    /// Record an issue for `rule` at `range`.
    fn emit_issue(
        &mut self,
        rule: &dyn Rule,
        message: String,
        range: SourceRange,
    ) -> Result<(), HostError>;
}

/// Runs rules against one [`SourceModule`] and collects their issues.
#[derive(Debug)]
pub struct ModuleRunner<'m> {
    module: &'m SourceModule,
    issues: Vec<Issue>,
}

impl<'m> ModuleRunner<'m> {
    pub fn new(module: &'m SourceModule) -> Self {
        Self {
            module,
            issues: Vec::new(),
        }
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

impl Runner for ModuleRunner<'_> {
    fn module_path(&self) -> Result<ModulePath, HostError> {
        Ok(self.module.path().clone())
    }

    fn module_content(&self, schema: &BodySchema) -> Result<Vec<ContentBlock>, HostError> {
        let mut blocks = Vec::new();
        for file in self.module.files() {
            let content = schema.extract(&file.name, &file.body)?;
            blocks.extend(content.blocks.into_iter().map(|block| ContentBlock {
                filename: file.name.clone(),
                block,
            }));
        }
        Ok(blocks)
    }

    fn emit_issue(
        &mut self,
        rule: &dyn Rule,
        message: String,
        range: SourceRange,
    ) -> Result<(), HostError> {
        if self.module.file(&range.filename).is_none() {
            return Err(HostError::Emit(format!(
                "{} is not part of module {}",
                range.filename,
                self.module.path()
            )));
        }
        trace!(rule = rule.name(), %range, "issue");
        self.issues.push(Issue {
            rule: rule.name().to_string(),
            severity: rule.severity(),
            message,
            range,
            link: rule.link().to_string(),
        });
        Ok(())
    }
}
