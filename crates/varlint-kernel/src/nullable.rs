//! Nullability policy.
//!
//! A variable is nullable unless it says `nullable = false`, so the only way
//! to be non-nullable is an explicit `false`. An absent attribute is passed
//! in as a null of type bool; a literal `null` counts the same.

use crate::value::{Type, Value};

/// Check a `nullable` attribute value against the wanted policy.
///
/// | actual        | want `true` | want `false` |
/// |---------------|-------------|--------------|
/// | null / absent | pass        | fail         |
/// | `true`        | pass        | fail         |
/// | `false`       | fail        | pass         |
/// | anything else | fail        | fail         |
pub fn check_nullable(actual: &Value, want_nullable: bool) -> bool {
    match actual {
        Value::Null(Type::Bool | Type::Any) => want_nullable,
        Value::Bool(nullable) => *nullable == want_nullable,
        _ => false,
    }
}
