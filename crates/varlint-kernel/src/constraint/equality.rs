//! Structural equality over constraint models and values.
//!
//! Exact equality only: no assignability, no conversion. Object attributes
//! are matched by name, so declaration order does not matter.

use std::collections::BTreeMap;

use crate::value::{Field, Type, Value};

use super::{ConstraintModel, Defaults};

/// Shapes equal and defaults equal at every position, including whether a
/// default is present at all.
pub fn equal(a: &ConstraintModel, b: &ConstraintModel) -> bool {
    equal_type(a.shape(), b.shape())
        && match (a.defaults(), b.defaults()) {
            (None, None) => true,
            (Some(x), Some(y)) => equal_defaults(x, y),
            _ => false,
        }
}

pub fn equal_type(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::String, Type::String)
        | (Type::Number, Type::Number)
        | (Type::Bool, Type::Bool)
        | (Type::Any, Type::Any) => true,
        (Type::List(x), Type::List(y))
        | (Type::Set(x), Type::Set(y))
        | (Type::Map(x), Type::Map(y)) => equal_type(x, y),
        (Type::Object(x), Type::Object(y)) => equal_fields(x, y),
        (Type::Tuple(x), Type::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| equal_type(x, y))
        }
        _ => false,
    }
}

fn equal_fields(a: &[Field], b: &[Field]) -> bool {
    a.len() == b.len()
        && a.iter().all(|fa| {
            b.iter().any(|fb| {
                fa.name == fb.name && fa.optional == fb.optional && equal_type(&fa.ty, &fb.ty)
            })
        })
        && b.iter().all(|fb| a.iter().any(|fa| fa.name == fb.name))
}

fn equal_defaults(a: &Defaults, b: &Defaults) -> bool {
    equal_type(&a.ty, &b.ty)
        && equal_maps(&a.values, &b.values, equal_value)
        && equal_maps(&a.children, &b.children, equal_defaults)
}

fn equal_maps<T>(
    a: &BTreeMap<String, T>,
    b: &BTreeMap<String, T>,
    eq: impl Fn(&T, &T) -> bool,
) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(key, x)| b.get(key).is_some_and(|y| eq(x, y)))
}

/// Type-aware value equality.
///
/// Values of different types are never equal (`2` is not `"2"`). Two nulls
/// are equal when their types agree or when either is the `any` type.
pub fn equal_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null(x), Value::Null(y)) => {
            matches!(x, Type::Any) || matches!(y, Type::Any) || equal_type(x, y)
        }
        (Value::Null(_), _) | (_, Value::Null(_)) => false,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Tuple(x), Value::Tuple(y)) => equal_items(x, y),
        (Value::Object(x), Value::Object(y)) => equal_maps(x, y, equal_value),
        (
            Value::List {
                elem: ex,
                items: x,
            },
            Value::List {
                elem: ey,
                items: y,
            },
        ) => equal_type(ex, ey) && equal_items(x, y),
        (
            Value::Set {
                elem: ex,
                items: x,
            },
            Value::Set {
                elem: ey,
                items: y,
            },
        ) => {
            equal_type(ex, ey)
                && x.len() == y.len()
                && x.iter().all(|v| y.iter().any(|w| equal_value(v, w)))
                && y.iter().all(|w| x.iter().any(|v| equal_value(v, w)))
        }
        (
            Value::Map {
                elem: ex,
                entries: x,
            },
            Value::Map {
                elem: ey,
                entries: y,
            },
        ) => equal_type(ex, ey) && equal_maps(x, y, equal_value),
        _ => false,
    }
}

fn equal_items(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equal_value(x, y))
}
