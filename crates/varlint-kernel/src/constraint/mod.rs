//! Type constraints with defaults.
//!
//! A [`ConstraintModel`] is what a variable's `type` attribute means: a
//! structural [`Type`] plus the default values that `optional(type, default)`
//! markers attach anywhere inside it. Two models are equal when both the
//! shape and every default agree; see [`equality`].

mod builder;
pub mod equality;

use std::collections::BTreeMap;

use crate::ast::{Expression, Span};
use crate::value::{Type, Value};

pub use builder::build;
pub use equality::{equal, equal_type, equal_value};

/// A type constraint together with its nested defaults.
///
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct ConstraintModel {
    shape: Type,
    defaults: Option<Defaults>,
}

impl ConstraintModel {
    /// Build a model from a parsed type expression.
    pub fn from_expression(expr: &Expression) -> Result<Self, ConstraintParseError> {
        build(expr)
    }

    pub fn shape(&self) -> &Type {
        &self.shape
    }

    /// `None` when the constraint has no `optional(..., default)` anywhere.
    pub fn defaults(&self) -> Option<&Defaults> {
        self.defaults.as_ref()
    }
}

/// Structural equality, see [`equality::equal`].
impl PartialEq for ConstraintModel {
    fn eq(&self, other: &Self) -> bool {
        equal(self, other)
    }
}

/// Default values mirroring a [`Type`].
///
/// `values` holds the default for each optional attribute of an object node;
/// `children` descends into attributes (by name), collection elements (key
/// `""`), and tuple elements (decimal index). A node only exists where a
/// default exists at or below it.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub ty: Type,
    pub values: BTreeMap<String, Value>,
    pub children: BTreeMap<String, Defaults>,
}

impl Defaults {
    fn is_empty(&self) -> bool {
        self.values.is_empty() && self.children.is_empty()
    }
}

/// The expression is not a valid type constraint.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid type specification: {message}")]
pub struct ConstraintParseError {
    pub span: Span,
    pub message: String,
}

impl ConstraintParseError {
    fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}
