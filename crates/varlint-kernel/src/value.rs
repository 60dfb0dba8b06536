//! Types and values.
//!
//! A small typed value model: every value knows its type, and nulls carry
//! the type they stand in for. Literal expressions evaluate to the literal
//! forms (`Tuple`, `Object`); the collection forms (`List`, `Set`, `Map`)
//! appear only after [`Value::convert`] has shaped a value to a declared type.

use std::collections::BTreeMap;
use std::fmt;

/// A structural type.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    String,
    Number,
    Bool,
    /// `any`: accepts every type.
    Any,
    List(Box<Type>),
    Set(Box<Type>),
    Map(Box<Type>),
    /// Fields in declaration order.
    Object(Vec<Field>),
    Tuple(Vec<Type>),
}

/// One attribute of an object type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub optional: bool,
}

impl Type {
    /// Look up an object attribute by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self {
            Type::Object(fields) => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }

    pub fn friendly_name(&self) -> &'static str {
        match self {
            Type::String => "string",
            Type::Number => "number",
            Type::Bool => "bool",
            Type::Any => "any",
            Type::List(_) => "list",
            Type::Set(_) => "set",
            Type::Map(_) => "map",
            Type::Object(_) => "object",
            Type::Tuple(_) => "tuple",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::String | Type::Number | Type::Bool | Type::Any => {
                write!(f, "{}", self.friendly_name())
            }
            Type::List(e) => write!(f, "list({e})"),
            Type::Set(e) => write!(f, "set({e})"),
            Type::Map(e) => write!(f, "map({e})"),
            Type::Object(fields) => {
                write!(f, "object({{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if field.optional {
                        write!(f, "{} = optional({})", field.name, field.ty)?;
                    } else {
                        write!(f, "{} = {}", field.name, field.ty)?;
                    }
                }
                write!(f, "}})")
            }
            Type::Tuple(elems) => {
                write!(f, "tuple([")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, "])")
            }
        }
    }
}

/// A typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A null standing in for a value of the given type.
    Null(Type),
    Bool(bool),
    Number(f64),
    String(String),
    /// `[a, b]` literal: each element keeps its own type.
    Tuple(Vec<Value>),
    /// `{ k = v }` literal, keyed by attribute name.
    Object(BTreeMap<String, Value>),
    List { elem: Type, items: Vec<Value> },
    Set { elem: Type, items: Vec<Value> },
    Map { elem: Type, entries: BTreeMap<String, Value> },
}

/// A value could not be shaped to a type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    #[error("{path}: {want} required, got {got}")]
    Mismatch {
        path: String,
        want: String,
        got: &'static str,
    },
    #[error("{path}: attribute {name:?} is required")]
    MissingAttribute { path: String, name: String },
    #[error("{path}: unsupported attribute {name:?}")]
    UnexpectedAttribute { path: String, name: String },
    #[error("{path}: tuple of {want} elements required, got {got}")]
    TupleLength { path: String, want: usize, got: usize },
}

impl Value {
    pub fn null() -> Self {
        Value::Null(Type::Any)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    /// The type of this value. Literal tuples and objects report the
    /// structural type of their elements.
    pub fn ty(&self) -> Type {
        match self {
            Value::Null(ty) => ty.clone(),
            Value::Bool(_) => Type::Bool,
            Value::Number(_) => Type::Number,
            Value::String(_) => Type::String,
            Value::Tuple(items) => Type::Tuple(items.iter().map(Value::ty).collect()),
            Value::Object(attrs) => Type::Object(
                attrs
                    .iter()
                    .map(|(name, v)| Field {
                        name: name.clone(),
                        ty: v.ty(),
                        optional: false,
                    })
                    .collect(),
            ),
            Value::List { elem, .. } => Type::List(Box::new(elem.clone())),
            Value::Set { elem, .. } => Type::Set(Box::new(elem.clone())),
            Value::Map { elem, .. } => Type::Map(Box::new(elem.clone())),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Value::Null(_) => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Tuple(_) => "tuple",
            Value::Object(_) => "object",
            Value::List { .. } => "list",
            Value::Set { .. } => "set",
            Value::Map { .. } => "map",
        }
    }

    /// Shape this value to `ty`, the way an `optional(...)` default is
    /// shaped to its attribute type.
    ///
    /// Nulls become typed nulls, primitives convert between string, number
    /// and bool where the text allows it, tuples become lists/sets/tuples,
    /// and objects become maps/objects. Object targets fill absent optional
    /// attributes with typed nulls.
    pub fn convert(self, ty: &Type) -> Result<Value, ConvertError> {
        convert_at(self, ty, "value")
    }
}

fn convert_at(value: Value, ty: &Type, path: &str) -> Result<Value, ConvertError> {
    let mismatch = |value: &Value| ConvertError::Mismatch {
        path: path.to_string(),
        want: ty.to_string(),
        got: value.kind_name(),
    };

    if let Value::Null(_) = value {
        return Ok(Value::Null(ty.clone()));
    }

    match ty {
        Type::Any => Ok(value),
        Type::String => match value {
            Value::String(_) => Ok(value),
            Value::Number(n) => Ok(Value::String(format_number(n))),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(mismatch(&other)),
        },
        Type::Number => match value {
            Value::Number(_) => Ok(value),
            Value::String(ref s) => match s.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Value::Number(n)),
                _ => Err(mismatch(&value)),
            },
            other => Err(mismatch(&other)),
        },
        Type::Bool => match value {
            Value::Bool(_) => Ok(value),
            Value::String(ref s) if s == "true" => Ok(Value::Bool(true)),
            Value::String(ref s) if s == "false" => Ok(Value::Bool(false)),
            other => Err(mismatch(&other)),
        },
        Type::List(elem) | Type::Set(elem) => {
            let items = match value {
                Value::Tuple(items) => items,
                Value::List { items, .. } | Value::Set { items, .. } => items,
                other => return Err(mismatch(&other)),
            };
            let mut converted = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                converted.push(convert_at(item, elem, &format!("{path}[{i}]"))?);
            }
            let elem = elem.as_ref().clone();
            if matches!(ty, Type::Set(_)) {
                let mut unique: Vec<Value> = Vec::with_capacity(converted.len());
                for item in converted {
                    if !unique.contains(&item) {
                        unique.push(item);
                    }
                }
                Ok(Value::Set {
                    elem,
                    items: unique,
                })
            } else {
                Ok(Value::List {
                    elem,
                    items: converted,
                })
            }
        }
        Type::Map(elem) => {
            let attrs = match value {
                Value::Object(attrs) => attrs,
                Value::Map { entries, .. } => entries,
                other => return Err(mismatch(&other)),
            };
            let mut entries = BTreeMap::new();
            for (key, item) in attrs {
                let item = convert_at(item, elem, &format!("{path}.{key}"))?;
                entries.insert(key, item);
            }
            Ok(Value::Map {
                elem: elem.as_ref().clone(),
                entries,
            })
        }
        Type::Object(fields) => {
            let mut attrs = match value {
                Value::Object(attrs) => attrs,
                Value::Map { entries, .. } => entries,
                other => return Err(mismatch(&other)),
            };
            if let Some(name) = attrs.keys().find(|k| ty.field(k).is_none()) {
                return Err(ConvertError::UnexpectedAttribute {
                    path: path.to_string(),
                    name: name.to_string(),
                });
            }
            let mut out = BTreeMap::new();
            for field in fields {
                let item = match attrs.remove(&field.name) {
                    Some(item) => {
                        convert_at(item, &field.ty, &format!("{path}.{}", field.name))?
                    }
                    None if field.optional => Value::Null(field.ty.clone()),
                    None => {
                        return Err(ConvertError::MissingAttribute {
                            path: path.to_string(),
                            name: field.name.clone(),
                        });
                    }
                };
                out.insert(field.name.clone(), item);
            }
            Ok(Value::Object(out))
        }
        Type::Tuple(elems) => {
            let items = match value {
                Value::Tuple(items) => items,
                other => return Err(mismatch(&other)),
            };
            if items.len() != elems.len() {
                return Err(ConvertError::TupleLength {
                    path: path.to_string(),
                    want: elems.len(),
                    got: items.len(),
                });
            }
            let converted = items
                .into_iter()
                .zip(elems)
                .enumerate()
                .map(|(i, (item, ety))| convert_at(item, ety, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Tuple(converted))
        }
    }
}

/// Integers print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            // A literal `${` or `%{` must not read back as interpolation.
            '$' | '%' if chars.peek() == Some(&'{') => write!(f, "{ch}{ch}")?,
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\r' => write!(f, "\\r")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "]")
}

fn write_attrs(f: &mut fmt::Formatter<'_>, attrs: &BTreeMap<String, Value>) -> fmt::Result {
    if attrs.is_empty() {
        return write!(f, "{{}}");
    }
    write!(f, "{{ ")?;
    for (i, (key, item)) in attrs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        if is_identifier(key) {
            write!(f, "{key} = {item}")?;
        } else {
            write_string(f, key)?;
            write!(f, " = {item}")?;
        }
    }
    write!(f, " }}")
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !matches!(s, "true" | "false" | "null")
}

/// Renders as an HCL literal.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null(_) => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write_string(f, s),
            Value::Tuple(items) | Value::List { items, .. } | Value::Set { items, .. } => {
                write_items(f, items)
            }
            Value::Object(attrs) | Value::Map { entries: attrs, .. } => write_attrs(f, attrs),
        }
    }
}
