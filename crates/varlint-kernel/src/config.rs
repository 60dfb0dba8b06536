//! Variable specifications and the catalog that holds them.
//!
//! A catalog is a TOML file with one `[[variable]]` table per required
//! variable:
//!
//! ```toml
//! [[variable]]
//! name = "kind"
//! type = "string"
//! default = '"foo"'
//! nullable = false
//! link = "https://example.com/docs/kind"
//! ```
//!
//! `default` is HCL literal text; leaving it out means `null`. Every
//! specification is validated while the catalog loads, so a bad `type` or
//! `default` stops everything before any module is inspected.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::constraint::{ConstraintModel, ConstraintParseError};
use crate::eval::{EvalError, evaluate};
use crate::parser::{ParseError, parse_expression};
use crate::rule::VariableRule;
use crate::runner::Severity;
use crate::value::Value;

/// A specification or catalog could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum SpecificationError {
    #[error("variable {name:?}: type {text:?} does not parse: {}", first_message(.errors))]
    TypeSyntax {
        name: String,
        text: String,
        errors: Vec<ParseError>,
    },

    #[error("variable {name:?}: {source}")]
    TypeConstraint {
        name: String,
        #[source]
        source: ConstraintParseError,
    },

    #[error("variable {name:?}: default {text:?} does not parse: {}", first_message(.errors))]
    DefaultSyntax {
        name: String,
        text: String,
        errors: Vec<ParseError>,
    },

    #[error("variable {name:?}: default {text:?} is not a literal: {source}")]
    DefaultValue {
        name: String,
        text: String,
        #[source]
        source: EvalError,
    },

    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog: {0}")]
    Toml(#[from] toml::de::Error),
}

fn first_message(errors: &[ParseError]) -> String {
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown error".to_string())
}

/// What one variable declaration must look like.
///
/// The expected type constraint is built once, when the specification is
/// created, so a specification that exists is always well-formed.
#[derive(Debug, Clone)]
pub struct Specification {
    name: String,
    type_text: String,
    expected: ConstraintModel,
    default: Value,
    nullable: bool,
    enabled: bool,
    severity: Severity,
    link: String,
}

impl Specification {
    /// A specification with a `null` default that allows null values.
    pub fn new(
        name: impl Into<String>,
        type_text: impl Into<String>,
    ) -> Result<Self, SpecificationError> {
        let name = name.into();
        let type_text = type_text.into();

        let expr = parse_expression(&type_text).map_err(|errors| {
            SpecificationError::TypeSyntax {
                name: name.clone(),
                text: type_text.clone(),
                errors,
            }
        })?;
        let expected = ConstraintModel::from_expression(&expr).map_err(|source| {
            SpecificationError::TypeConstraint {
                name: name.clone(),
                source,
            }
        })?;

        Ok(Self {
            name,
            type_text,
            expected,
            default: Value::null(),
            nullable: true,
            enabled: true,
            severity: Severity::Error,
            link: String::new(),
        })
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    /// Set the default from HCL literal text, e.g. `"\"foo\""` or `[1, 2]`.
    pub fn with_default_text(self, text: &str) -> Result<Self, SpecificationError> {
        let expr = parse_expression(text).map_err(|errors| SpecificationError::DefaultSyntax {
            name: self.name.clone(),
            text: text.to_string(),
            errors,
        })?;
        let default = evaluate(&expr).map_err(|source| SpecificationError::DefaultValue {
            name: self.name.clone(),
            text: text.to_string(),
            source,
        })?;
        Ok(self.with_default(default))
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type constraint exactly as written in the catalog.
    pub fn type_text(&self) -> &str {
        &self.type_text
    }

    pub fn expected(&self) -> &ConstraintModel {
        &self.expected
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    /// A variable declaration that satisfies this specification.
    pub fn render_stub(&self) -> String {
        let mut attrs = vec![
            ("type", self.type_text.trim().to_string()),
            ("default", self.default.to_string()),
        ];
        if !self.nullable {
            attrs.push(("nullable", "false".to_string()));
        }
        let width = attrs.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

        let mut out = format!("variable \"{}\" {{\n", self.name);
        for (key, value) in attrs {
            out.push_str(&format!("  {key:<width$} = {}\n", indent_continuation(&value)));
        }
        out.push_str("}\n");
        out
    }
}

/// Indent every line after the first by one level, so multi-line type text
/// sits inside the block.
fn indent_continuation(value: &str) -> String {
    value.replace('\n', "\n  ")
}

/// One `[[variable]]` table as written in the catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecificationConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_text: String,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub link: String,
}

fn default_true() -> bool {
    true
}

impl TryFrom<SpecificationConfig> for Specification {
    type Error = SpecificationError;

    fn try_from(config: SpecificationConfig) -> Result<Self, Self::Error> {
        let mut spec = Specification::new(config.name, config.type_text)?
            .with_nullable(config.nullable)
            .with_enabled(config.enabled)
            .with_severity(config.severity)
            .with_link(config.link);
        if let Some(text) = config.default {
            spec = spec.with_default_text(&text)?;
        }
        Ok(spec)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default, rename = "variable")]
    variables: Vec<SpecificationConfig>,
}

/// The full set of specifications to enforce.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    specs: Vec<Specification>,
}

impl Catalog {
    /// Parse a catalog from TOML text. Fails on the first invalid entry.
    pub fn from_toml(text: &str) -> Result<Self, SpecificationError> {
        let file: CatalogFile = toml::from_str(text)?;
        let specs = file
            .variables
            .into_iter()
            .map(Specification::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = specs.len(), "loaded catalog");
        Ok(Self { specs })
    }

    pub fn load(path: &Path) -> Result<Self, SpecificationError> {
        let text = std::fs::read_to_string(path).map_err(|source| SpecificationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specification> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Every specification for `name`. Duplicates are kept.
    pub fn matching<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Specification> + 'a {
        self.specs.iter().filter(move |s| s.name == name)
    }

    /// One rule per enabled specification, in catalog order.
    pub fn rules(&self) -> Vec<VariableRule> {
        self.specs
            .iter()
            .filter(|s| s.enabled)
            .cloned()
            .map(VariableRule::new)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::equal_value;
    use crate::value::Type;

    const CATALOG: &str = r#"
[[variable]]
name = "kind"
type = "string"
default = '"foo"'
nullable = false
link = "https://example.com/kind"

[[variable]]
name = "tags"
type = "map(string)"
default = "{}"
severity = "warning"

[[variable]]
name = "legacy"
type = "any"
enabled = false
"#;

    #[test]
    fn loads_catalog_with_defaults() {
        let catalog = Catalog::from_toml(CATALOG).unwrap();
        assert_eq!(catalog.len(), 3);

        let kind = catalog.matching("kind").next().unwrap();
        assert_eq!(kind.type_text(), "string");
        assert_eq!(kind.default_value(), &Value::string("foo"));
        assert!(!kind.nullable());
        assert_eq!(kind.severity(), Severity::Error);
        assert_eq!(kind.link(), "https://example.com/kind");

        let tags = catalog.matching("tags").next().unwrap();
        assert!(tags.nullable());
        assert_eq!(tags.severity(), Severity::Warning);
        assert_eq!(tags.link(), "");

        let legacy = catalog.matching("legacy").next().unwrap();
        assert!(equal_value(legacy.default_value(), &Value::Null(Type::Any)));
        assert!(!legacy.enabled());
    }

    #[test]
    fn rules_skip_disabled() {
        let catalog = Catalog::from_toml(CATALOG).unwrap();
        let names: Vec<_> = catalog
            .rules()
            .iter()
            .map(|r| r.specification().name().to_string())
            .collect();
        assert_eq!(names, vec!["kind", "tags"]);
    }

    #[test]
    fn duplicate_names_are_kept() {
        let catalog = Catalog::from_toml(
            "[[variable]]\nname = \"a\"\ntype = \"string\"\n\n[[variable]]\nname = \"a\"\ntype = \"number\"\n",
        )
        .unwrap();
        assert_eq!(catalog.matching("a").count(), 2);
        assert_eq!(catalog.rules().len(), 2);
    }

    #[test]
    fn empty_catalog() {
        let catalog = Catalog::from_toml("").unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.rules().is_empty());
    }

    #[test]
    fn invalid_type_fails_fast() {
        let err = Catalog::from_toml(
            "[[variable]]\nname = \"a\"\ntype = \"strng\"\n\n[[variable]]\nname = \"b\"\ntype = \"string\"\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SpecificationError::TypeConstraint { ref name, .. } if name == "a"
        ));
    }

    #[test]
    fn unparseable_type_fails() {
        let err = Specification::new("a", "object({").unwrap_err();
        assert!(matches!(err, SpecificationError::TypeSyntax { .. }));
    }

    #[test]
    fn non_literal_default_fails() {
        let err = Specification::new("a", "string")
            .unwrap()
            .with_default_text("var.other")
            .unwrap_err();
        assert!(matches!(err, SpecificationError::DefaultValue { .. }));
    }

    #[test]
    fn overflowing_number_default_fails() {
        let err = Specification::new("n", "number")
            .unwrap()
            .with_default_text("1e400")
            .unwrap_err();
        assert!(matches!(err, SpecificationError::DefaultSyntax { .. }));
    }

    #[test]
    fn escaped_interpolation_default_renders_escaped() {
        let spec = Specification::new("greeting", "string")
            .unwrap()
            .with_default_text("\"$${name}\"")
            .unwrap();
        assert_eq!(spec.default_value(), &Value::string("${name}"));
        assert!(spec.render_stub().contains("default = \"$${name}\""));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Catalog::from_toml("[[variable]]\nname = \"a\"\ntype = \"string\"\nnulable = false\n")
            .unwrap_err();
        assert!(matches!(err, SpecificationError::Toml(_)));
    }

    #[test]
    fn stub_for_non_nullable_string() {
        let spec = Specification::new("kind", "string")
            .unwrap()
            .with_default(Value::string("foo"))
            .with_nullable(false);
        insta::assert_snapshot!(spec.render_stub().trim_end(), @r#"
        variable "kind" {
          type     = string
          default  = "foo"
          nullable = false
        }
        "#);
    }

    #[test]
    fn stub_for_nullable_object() {
        let spec = Specification::new(
            "settings",
            "object({\n  name = optional(string, null)\n  size = number\n})",
        )
        .unwrap()
        .with_default_text("{ size = 1 }")
        .unwrap();
        insta::assert_snapshot!(spec.render_stub().trim_end(), @r#"
        variable "settings" {
          type    = object({
            name = optional(string, null)
            size = number
          })
          default = { size = 1 }
        }
        "#);
    }
}
