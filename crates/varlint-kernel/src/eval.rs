//! Literal evaluation.
//!
//! Reduces constant expressions to [`Value`]s. There is no scope: anything
//! that would need one (references, function calls, interpolation) is an
//! error carrying the span of the offending expression. Operators,
//! conditionals, and `for` expressions are not literal values either.

use std::collections::BTreeMap;

use crate::ast::{ExprKind, Expression, Literal, ObjectKey, Span};
use crate::value::Value;

/// Errors that can occur during literal evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("variables not allowed here: {name}")]
    VariablesNotAllowed { name: String, span: Span },
    #[error("function calls not allowed here: {name}()")]
    FunctionsNotAllowed { name: String, span: Span },
    #[error("string interpolation not allowed here")]
    TemplateNotAllowed { span: Span },
    #[error("duplicate object key {key:?}")]
    DuplicateKey { key: String, span: Span },
    #[error("unsuitable value for unary negation: number required")]
    NotANumber { span: Span },
    #[error("object key must be a string")]
    KeyNotAString { span: Span },
    #[error("only literal values are allowed here")]
    NotALiteral { span: Span },
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::VariablesNotAllowed { span, .. }
            | EvalError::FunctionsNotAllowed { span, .. }
            | EvalError::TemplateNotAllowed { span }
            | EvalError::DuplicateKey { span, .. }
            | EvalError::NotANumber { span }
            | EvalError::KeyNotAString { span }
            | EvalError::NotALiteral { span } => *span,
        }
    }
}

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Evaluate a constant expression.
pub fn evaluate(expr: &Expression) -> EvalResult<Value> {
    match &expr.kind {
        ExprKind::Literal(literal) => Ok(match literal {
            Literal::Null => Value::null(),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.clone()),
        }),
        ExprKind::Negate(inner) => match evaluate(inner)? {
            Value::Number(n) => Ok(Value::Number(-n)),
            _ => Err(EvalError::NotANumber { span: expr.span }),
        },
        ExprKind::Tuple(items) => items
            .iter()
            .map(evaluate)
            .collect::<EvalResult<Vec<_>>>()
            .map(Value::Tuple),
        ExprKind::Object(items) => {
            let mut attrs = BTreeMap::new();
            for item in items {
                let key = match &item.key {
                    ObjectKey::Name(name) => name.clone(),
                    ObjectKey::Expression(key) => match evaluate(key)? {
                        Value::String(s) => s,
                        _ => return Err(EvalError::KeyNotAString { span: item.key_span }),
                    },
                };
                let value = evaluate(&item.value)?;
                if attrs.contains_key(&key) {
                    return Err(EvalError::DuplicateKey {
                        key,
                        span: item.key_span,
                    });
                }
                attrs.insert(key, value);
            }
            Ok(Value::Object(attrs))
        }
        ExprKind::Traversal(steps) => Err(EvalError::VariablesNotAllowed {
            name: steps.join("."),
            span: expr.span,
        }),
        ExprKind::Call { name, .. } => Err(EvalError::FunctionsNotAllowed {
            name: name.clone(),
            span: expr.span,
        }),
        ExprKind::Template(_) => Err(EvalError::TemplateNotAllowed { span: expr.span }),
        ExprKind::Not(_)
        | ExprKind::Binary { .. }
        | ExprKind::Conditional { .. }
        | ExprKind::For(_)
        | ExprKind::GetAttr { .. }
        | ExprKind::Index { .. }
        | ExprKind::Splat(_) => Err(EvalError::NotALiteral { span: expr.span }),
    }
}
