//! Abstract syntax tree for HCL source.
//!
//! Bodies hold attributes and nested blocks; expressions keep the byte span
//! they were parsed from so issues can point back at source.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

/// Byte range into a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn range(self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl From<chumsky::span::SimpleSpan> for Span {
    fn from(span: chumsky::span::SimpleSpan) -> Self {
        Self::new(span.start, span.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A parsed expression together with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expression {
    pub fn new(kind: ExprKind, span: impl Into<Span>) -> Self {
        Self {
            kind,
            span: span.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `"text"`, `1.5`, `true`, `null`
    Literal(Literal),
    /// A quoted string or heredoc containing `${...}` or `%{...}`, kept raw.
    Template(String),
    /// `string`, `var.name`: a root name followed by attribute steps.
    Traversal(Vec<String>),
    /// `name(arg, ...)`, or `name(arg, list...)` when `expand` is set.
    Call {
        name: String,
        args: Vec<Expression>,
        expand: bool,
    },
    /// `[a, b, c]`
    Tuple(Vec<Expression>),
    /// `{ key = value, ... }`
    Object(Vec<ObjectItem>),
    /// `-expr`
    Negate(Box<Expression>),
    /// `!expr`
    Not(Box<Expression>),
    /// `lhs op rhs`
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    /// `condition ? then : otherwise`
    Conditional {
        condition: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
    /// `[for ...]` or `{for ...}`
    For(Box<ForExpr>),
    /// `target.name` after an index, call, or other non-name expression.
    GetAttr { target: Box<Expression>, name: String },
    /// `target[key]`, or the legacy `target.0`
    Index {
        target: Box<Expression>,
        key: Box<Expression>,
    },
    /// `target[*]` or `target.*`
    Splat(Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// `for k, v in collection : value if condition`
#[derive(Debug, Clone, PartialEq)]
pub struct ForExpr {
    pub key_var: Option<String>,
    pub value_var: String,
    pub collection: Expression,
    /// Present only in the object form, before `=>`.
    pub key: Option<Expression>,
    pub value: Expression,
    /// `...` after the value: group values by key.
    pub grouped: bool,
    pub condition: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// One `key = value` pair of an object constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectItem {
    pub key: ObjectKey,
    pub key_span: Span,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKey {
    /// A bare identifier or a literal string.
    Name(String),
    /// Any other key, e.g. `(var.key)` or `"${prefix}-name"`.
    Expression(Box<Expression>),
}

/// The contents of a file or a block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<Block>,
}

impl Body {
    /// Look up an attribute by name. Parsed bodies never repeat a name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// `name = expr`
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub expr: Expression,
    /// Covers the name through the end of the expression.
    pub span: Span,
}

/// `kind "label" ... { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: String,
    pub labels: Vec<String>,
    pub body: Body,
    /// The block header: kind keyword through the last label.
    pub def_span: Span,
    pub span: Span,
}
