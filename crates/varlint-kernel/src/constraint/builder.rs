//! Builds [`ConstraintModel`]s from type expressions.
//!
//! Shape and defaults are resolved in one recursive pass. Accepted forms:
//!
//! - keywords: `string`, `number`, `bool`, `any`
//! - `list(T)`, `set(T)`, `map(T)`
//! - `object({ name = T, other = optional(T[, default]) })`
//! - `tuple([T, ...])`

use std::collections::BTreeMap;

use crate::ast::{ExprKind, Expression, ObjectItem, ObjectKey};
use crate::eval::evaluate;
use crate::value::{Field, Type};

use super::{ConstraintModel, ConstraintParseError, Defaults};

type Built = (Type, Option<Defaults>);

const NOT_A_TYPE: &str = "A type specification is either a primitive type keyword \
(bool, number, string) or a complex type constructor call, like list(string).";

/// Resolve a type expression into its shape and defaults.
pub fn build(expr: &Expression) -> Result<ConstraintModel, ConstraintParseError> {
    let (shape, defaults) = type_of(expr)?;
    Ok(ConstraintModel { shape, defaults })
}

fn type_of(expr: &Expression) -> Result<Built, ConstraintParseError> {
    match &expr.kind {
        ExprKind::Traversal(steps) if steps.len() == 1 => keyword(expr, &steps[0]),
        ExprKind::Call { name, args, .. } => constructor(expr, name, args),
        _ => Err(ConstraintParseError::new(expr.span, NOT_A_TYPE)),
    }
}

fn keyword(expr: &Expression, name: &str) -> Result<Built, ConstraintParseError> {
    let ty = match name {
        "string" => Type::String,
        "number" => Type::Number,
        "bool" => Type::Bool,
        "any" => Type::Any,
        "list" | "set" | "map" => {
            return Err(ConstraintParseError::new(
                expr.span,
                format!(
                    "The {name} type constructor requires one argument specifying the element type."
                ),
            ));
        }
        "object" => {
            return Err(ConstraintParseError::new(
                expr.span,
                "The object type constructor requires one argument specifying the attribute types as a map.",
            ));
        }
        "tuple" => {
            return Err(ConstraintParseError::new(
                expr.span,
                "The tuple type constructor requires one argument specifying the element types as a list.",
            ));
        }
        "optional" => return Err(optional_misplaced(expr)),
        other => {
            return Err(ConstraintParseError::new(
                expr.span,
                format!("The keyword {other:?} is not a valid type specification."),
            ));
        }
    };
    Ok((ty, None))
}

fn constructor(
    expr: &Expression,
    name: &str,
    args: &[Expression],
) -> Result<Built, ConstraintParseError> {
    match name {
        "list" | "set" | "map" => {
            let [arg] = args else {
                return Err(ConstraintParseError::new(
                    expr.span,
                    format!(
                        "The {name} type constructor requires one argument specifying the element type."
                    ),
                ));
            };
            let (elem, elem_defaults) = type_of(arg)?;
            let elem = Box::new(elem);
            let ty = match name {
                "list" => Type::List(elem),
                "set" => Type::Set(elem),
                _ => Type::Map(elem),
            };
            let defaults = elem_defaults.map(|d| Defaults {
                ty: ty.clone(),
                values: BTreeMap::new(),
                children: BTreeMap::from([(String::new(), d)]),
            });
            Ok((ty, defaults))
        }
        "object" => match args {
            [Expression {
                kind: ExprKind::Object(items),
                ..
            }] => object(items),
            _ => Err(ConstraintParseError::new(
                expr.span,
                "Object type constructor requires a map whose keys are attribute names and whose values are the corresponding attribute types.",
            )),
        },
        "tuple" => match args {
            [Expression {
                kind: ExprKind::Tuple(elems),
                ..
            }] => tuple(elems),
            _ => Err(ConstraintParseError::new(
                expr.span,
                "Tuple type constructor requires a list of element types.",
            )),
        },
        "optional" => Err(optional_misplaced(expr)),
        other => Err(ConstraintParseError::new(
            expr.span,
            format!("Keyword {other:?} is not a valid type constructor."),
        )),
    }
}

fn object(items: &[ObjectItem]) -> Result<Built, ConstraintParseError> {
    let mut fields: Vec<Field> = Vec::with_capacity(items.len());
    let mut values = BTreeMap::new();
    let mut children = BTreeMap::new();

    for item in items {
        let ObjectKey::Name(key) = &item.key else {
            return Err(ConstraintParseError::new(
                item.key_span,
                "Object constructor map keys must be attribute names.",
            ));
        };
        if fields.iter().any(|f| f.name == *key) {
            return Err(ConstraintParseError::new(
                item.key_span,
                format!("Duplicate attribute {key:?} in object type."),
            ));
        }

        let (ty, optional, child) = match &item.value.kind {
            ExprKind::Call { name, args, .. } if name == "optional" => {
                let (ty, child) = match args.as_slice() {
                    [ty_expr] | [ty_expr, _] => type_of(ty_expr)?,
                    _ => {
                        return Err(ConstraintParseError::new(
                            item.value.span,
                            "Optional attribute modifier expects at most two arguments: the attribute type, and a default value.",
                        ));
                    }
                };
                if let [_, default_expr] = args.as_slice() {
                    let default = evaluate(default_expr)
                        .map_err(|e| {
                            ConstraintParseError::new(
                                default_expr.span,
                                format!("Invalid default value for optional attribute: {e}."),
                            )
                        })?
                        .convert(&ty)
                        .map_err(|e| {
                            ConstraintParseError::new(
                                default_expr.span,
                                format!(
                                    "Invalid default value for optional attribute: this default value is not compatible with the attribute's type constraint: {e}."
                                ),
                            )
                        })?;
                    values.insert(key.clone(), default);
                }
                (ty, true, child)
            }
            _ => {
                let (ty, child) = type_of(&item.value)?;
                (ty, false, child)
            }
        };

        if let Some(child) = child {
            children.insert(key.clone(), child);
        }
        fields.push(Field {
            name: key.clone(),
            ty,
            optional,
        });
    }

    let ty = Type::Object(fields);
    let defaults = Defaults {
        ty: ty.clone(),
        values,
        children,
    };
    Ok((ty, (!defaults.is_empty()).then_some(defaults)))
}

fn tuple(elems: &[Expression]) -> Result<Built, ConstraintParseError> {
    let mut types = Vec::with_capacity(elems.len());
    let mut children = BTreeMap::new();

    for (i, elem) in elems.iter().enumerate() {
        let (ty, child) = type_of(elem)?;
        if let Some(child) = child {
            children.insert(i.to_string(), child);
        }
        types.push(ty);
    }

    let ty = Type::Tuple(types);
    let defaults = Defaults {
        ty: ty.clone(),
        values: BTreeMap::new(),
        children,
    };
    Ok((ty, (!defaults.is_empty()).then_some(defaults)))
}

fn optional_misplaced(expr: &Expression) -> ConstraintParseError {
    ConstraintParseError::new(
        expr.span,
        "Keyword \"optional\" is valid only as a modifier for object type attributes.",
    )
}
