//! varlint-kernel: the core of varlint.
//!
//! This crate provides:
//!
//! - **Lexer**: Tokenizes HCL source using logos
//! - **Parser**: Builds the expression/body AST from tokens using chumsky
//! - **Eval**: Reduces literal expressions to typed values
//! - **Constraint**: Type constraints with nested `optional(...)` defaults, and
//!   their structural equality
//! - **Rule**: The variable interface rule, its specification catalog, and the
//!   host runner it reports through

pub mod ast;
pub mod config;
pub mod constraint;
pub mod eval;
pub mod lexer;
pub mod nullable;
pub mod parser;
pub mod rule;
pub mod runner;
pub mod value;

pub use config::{Catalog, Specification, SpecificationError};
pub use constraint::{ConstraintModel, ConstraintParseError};
pub use rule::{Rule, RuleError, VariableRule};
pub use runner::{
    HostError, Issue, ModulePath, ModuleRunner, Runner, Severity, SourceModule, SourceRange,
};
pub use value::{Type, Value};
