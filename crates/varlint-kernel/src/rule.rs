//! The variable interface rule.
//!
//! For each `variable` block in the root module whose name matches its
//! specification, [`VariableRule`] checks, in order:
//!
//! 1. `type` is declared and its constraint equals the expected one,
//!    defaults included;
//! 2. `default` is declared and equals the expected value;
//! 3. `nullable` follows the expected policy.
//!
//! A missing `type` or `default` stops the checks for that block. Mismatches
//! do not: one block can produce up to three issues.

use tracing::debug;

use crate::config::Specification;
use crate::constraint::{ConstraintModel, ConstraintParseError, equal_value};
use crate::eval::{EvalError, evaluate};
use crate::nullable::check_nullable;
use crate::runner::{ContentBlock, HostError, Runner, Severity, VARIABLE_BODY_SCHEMA};
use crate::value::{Type, Value};

/// Errors that abort a rule check.
///
/// Content the rule cannot interpret (a type that is not a type, a default
/// that is not a literal) is an error rather than an issue.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("{filename}: {source}")]
    Constraint {
        filename: String,
        #[source]
        source: ConstraintParseError,
    },

    #[error("{filename}: {source}")]
    Eval {
        filename: String,
        #[source]
        source: EvalError,
    },
}

/// A check run against one module.
pub trait Rule {
    fn name(&self) -> &str;

    fn enabled(&self) -> bool;

    fn severity(&self) -> Severity;

    /// Documentation link attached to the rule's issues.
    fn link(&self) -> &str;

    fn check(&self, runner: &mut dyn Runner) -> Result<(), RuleError>;
}

/// Enforces one [`Specification`].
#[derive(Debug, Clone)]
pub struct VariableRule {
    spec: Specification,
}

impl VariableRule {
    pub fn new(spec: Specification) -> Self {
        Self { spec }
    }

    pub fn specification(&self) -> &Specification {
        &self.spec
    }

    fn check_block(&self, runner: &mut dyn Runner, block: &ContentBlock) -> Result<(), RuleError> {
        let name = self.spec.name();

        let Some(type_attr) = block.attribute("type") else {
            debug!(variable = name, "type not declared");
            runner.emit_issue(
                self,
                format!("`{name}` variable type not declared"),
                block.def_range(),
            )?;
            return Ok(());
        };

        let actual = ConstraintModel::from_expression(&type_attr.expr).map_err(|source| {
            RuleError::Constraint {
                filename: block.filename.clone(),
                source,
            }
        })?;
        if actual != *self.spec.expected() {
            debug!(variable = name, "type mismatch");
            runner.emit_issue(
                self,
                format!(
                    "`{name}` variable type does not comply with the interface specification:\n\n{}",
                    self.spec.type_text()
                ),
                block.range(type_attr.span),
            )?;
        }

        let Some(default_attr) = block.attribute("default") else {
            debug!(variable = name, "default not declared");
            runner.emit_issue(
                self,
                format!("`var.{name}`: default not declared"),
                block.def_range(),
            )?;
            return Ok(());
        };

        let default = evaluate(&default_attr.expr).map_err(|source| RuleError::Eval {
            filename: block.filename.clone(),
            source,
        })?;
        if !equal_value(&default, self.spec.default_value()) {
            debug!(variable = name, %default, "default mismatch");
            runner.emit_issue(
                self,
                format!(
                    "`var.{name}`: default value is not correct, see: {}",
                    self.spec.link()
                ),
                block.def_range(),
            )?;
        }

        let nullable_attr = block.attribute("nullable");
        let nullable = match nullable_attr {
            Some(attr) => evaluate(&attr.expr).map_err(|source| RuleError::Eval {
                filename: block.filename.clone(),
                source,
            })?,
            None => Value::Null(Type::Bool),
        };
        let want = self.spec.nullable();
        if !check_nullable(&nullable, want) {
            debug!(variable = name, %nullable, want, "nullable mismatch");
            let message = if want {
                format!("`var.{name}`: nullable should not be set.")
            } else {
                format!("`var.{name}`: nullable should be set to false")
            };
            let range = match nullable_attr {
                Some(attr) => block.range(attr.span),
                None => block.def_range(),
            };
            runner.emit_issue(self, message, range)?;
        }

        Ok(())
    }
}

impl Rule for VariableRule {
    fn name(&self) -> &str {
        self.spec.name()
    }

    fn enabled(&self) -> bool {
        self.spec.enabled()
    }

    fn severity(&self) -> Severity {
        self.spec.severity()
    }

    fn link(&self) -> &str {
        self.spec.link()
    }

    fn check(&self, runner: &mut dyn Runner) -> Result<(), RuleError> {
        let path = runner.module_path()?;
        if !path.is_root() {
            debug!(rule = self.name(), module = %path, "skipping child module");
            return Ok(());
        }

        let content = runner.module_content(&VARIABLE_BODY_SCHEMA)?;
        for block in content
            .iter()
            .filter(|b| b.block.kind == "variable" && b.label() == Some(self.spec.name()))
        {
            debug!(rule = self.name(), file = %block.filename, "checking variable");
            self.check_block(runner, block)?;
        }
        Ok(())
    }
}
