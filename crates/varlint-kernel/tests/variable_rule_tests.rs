//! End-to-end checks of the variable rule against in-memory modules.

use varlint_kernel::runner::{BodySchema, ContentBlock};
use varlint_kernel::{
    Catalog, HostError, Issue, ModulePath, ModuleRunner, Rule, RuleError, Runner, SourceModule,
    SourceRange, Specification, SpecificationError, Value, VariableRule,
};

fn kind() -> Specification {
    Specification::new("kind", "string")
        .unwrap()
        .with_default(Value::string("foo"))
        .with_nullable(false)
}

fn check(rules: &[VariableRule], source: &str) -> Vec<Issue> {
    let module = SourceModule::from_sources(ModulePath::root(), [("main.tf", source)]).unwrap();
    let mut runner = ModuleRunner::new(&module);
    for rule in rules {
        rule.check(&mut runner).unwrap();
    }
    runner.into_issues()
}

fn messages(issues: &[Issue]) -> Vec<&str> {
    issues.iter().map(|i| i.message.as_str()).collect()
}

#[test]
fn compliant_block_has_no_issues() {
    let issues = check(
        &[VariableRule::new(kind())],
        r#"
variable "kind" {
  type     = string
  default  = "foo"
  nullable = false
}
"#,
    );
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn wrong_type_is_one_issue() {
    let issues = check(
        &[VariableRule::new(kind())],
        r#"
variable "kind" {
  type     = number
  default  = "foo"
  nullable = false
}
"#,
    );
    assert_eq!(
        messages(&issues),
        vec!["`kind` variable type does not comply with the interface specification:\n\nstring"]
    );
}

#[test]
fn omitted_nullable_is_one_issue() {
    let issues = check(
        &[VariableRule::new(kind())],
        r#"
variable "kind" {
  type    = string
  default = "foo"
}
"#,
    );
    assert_eq!(
        messages(&issues),
        vec!["`var.kind`: nullable should be set to false"]
    );
}

#[test]
fn nested_default_difference_is_a_type_mismatch() {
    let spec = Specification::new("settings", "object({name = optional(string, null)})").unwrap();
    let issues = check(
        &[VariableRule::new(spec)],
        r#"
variable "settings" {
  type    = object({ name = optional(string, "x") })
  default = null
}
"#,
    );
    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.starts_with("`settings` variable type does not comply"));
    assert!(issues[0].message.ends_with("object({name = optional(string, null)})"));
}

#[test]
fn unmatched_block_is_untouched() {
    let issues = check(
        &[VariableRule::new(kind())],
        "variable \"flavour\" {\n  type = bool\n}\n",
    );
    assert!(issues.is_empty());
}

#[test]
fn label_match_is_case_sensitive() {
    let issues = check(&[VariableRule::new(kind())], "variable \"Kind\" {}\n");
    assert!(issues.is_empty());
}

#[test]
fn all_three_mismatches_are_reported_in_order() {
    let issues = check(
        &[VariableRule::new(kind().with_link("https://example.com/kind"))],
        r#"
variable "kind" {
  type     = list(string)
  default  = "bar"
  nullable = "no"
}
"#,
    );
    assert_eq!(
        messages(&issues),
        vec![
            "`kind` variable type does not comply with the interface specification:\n\nstring",
            "`var.kind`: default value is not correct, see: https://example.com/kind",
            "`var.kind`: nullable should be set to false",
        ]
    );
}

#[test]
fn missing_type_short_circuits() {
    let issues = check(
        &[VariableRule::new(kind())],
        "variable \"kind\" {\n  default  = 1\n  nullable = true\n}\n",
    );
    assert_eq!(messages(&issues), vec!["`kind` variable type not declared"]);
}

#[test]
fn nullable_wanted_rejects_false() {
    let spec = Specification::new("tags", "map(string)")
        .unwrap()
        .with_default_text("{}")
        .unwrap();
    let rules = [VariableRule::new(spec)];

    let src = |nullable: &str| {
        format!("variable \"tags\" {{\n  type    = map(string)\n  default = {{}}\n{nullable}}}\n")
    };
    assert!(check(&rules, &src("")).is_empty());
    assert!(check(&rules, &src("  nullable = null\n")).is_empty());
    assert!(check(&rules, &src("  nullable = true\n")).is_empty());
    assert_eq!(
        messages(&check(&rules, &src("  nullable = false\n"))),
        vec!["`var.tags`: nullable should not be set."]
    );
}

#[test]
fn every_block_with_the_name_is_checked() {
    let issues = check(
        &[VariableRule::new(kind())],
        "variable \"kind\" {}\n\nvariable \"kind\" {\n  type = string\n}\n",
    );
    assert_eq!(
        messages(&issues),
        vec![
            "`kind` variable type not declared",
            "`var.kind`: default not declared"
        ]
    );
}

#[test]
fn duplicate_specifications_fire_independently() {
    let catalog = Catalog::from_toml(
        r#"
[[variable]]
name = "kind"
type = "string"

[[variable]]
name = "kind"
type = "number"
severity = "warning"
"#,
    )
    .unwrap();
    let issues = check(
        &catalog.rules(),
        "variable \"kind\" {\n  type    = string\n  default = null\n}\n",
    );
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, varlint_kernel::Severity::Warning);
}

#[test]
fn validation_blocks_are_ignored() {
    let issues = check(
        &[VariableRule::new(kind())],
        r#"
variable "kind" {
  type        = string
  default     = "foo"
  nullable    = false
  description = "The kind of thing"

  validation {
    condition     = contains(["foo", "bar"], var.kind)
    error_message = "Must be foo or bar."
  }
}
"#,
    );
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn ordinary_module_expressions_do_not_get_in_the_way() {
    let issues = check(
        &[VariableRule::new(kind())],
        r#"
variable "kind" {
  type     = string
  default  = "foo"
  nullable = false
  description = <<-EOT
    The kind of thing.
    Must not be empty.
  EOT

  validation {
    condition     = length(var.kind) > 0 && !startswith(var.kind, "-")
    error_message = "Got ${jsonencode(var.kind)}, see \"docs\"."
  }
}

variable "enabled" {
  type = bool
}

resource "null_resource" "this" {
  count = var.enabled ? 1 : 0
  triggers = {
    for k, v in local.settings : k => tostring(v) if v != null
  }
}

locals {
  settings = { first = var.list[0], ids = aws_instance.web[*].id }
}
"#,
    );
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn escaped_interpolation_default_is_literal() {
    let spec = Specification::new("greeting", "string")
        .unwrap()
        .with_default(Value::string("${name}"));
    let issues = check(
        &[VariableRule::new(spec)],
        "variable \"greeting\" {\n  type    = string\n  default = \"$${name}\"\n}\n",
    );
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn redefined_attribute_fails_to_load() {
    let err = SourceModule::from_sources(
        ModulePath::root(),
        [(
            "main.tf",
            "variable \"kind\" {\n  type = number\n  type = string\n}\n",
        )],
    )
    .unwrap_err();
    assert!(err.to_string().contains("\"type\" redefined"), "{err}");
}

#[test]
fn non_literal_default_is_an_error() {
    let module = SourceModule::from_sources(
        ModulePath::root(),
        [(
            "main.tf",
            "variable \"kind\" {\n  type    = string\n  default = var.other\n}\n",
        )],
    )
    .unwrap();
    let mut runner = ModuleRunner::new(&module);
    let err = VariableRule::new(kind()).check(&mut runner).unwrap_err();
    assert!(matches!(err, RuleError::Eval { .. }));
}

#[test]
fn malformed_specification_fails_before_checking() {
    let err = Catalog::from_toml(
        "[[variable]]\nname = \"kind\"\ntype = \"list(optional(string))\"\n",
    )
    .unwrap_err();
    assert!(matches!(err, SpecificationError::TypeConstraint { .. }));
}

#[test]
fn rendered_stub_is_compliant() {
    let catalog = Catalog::from_toml(
        r#"
[[variable]]
name = "kind"
type = "string"
default = '"foo"'
nullable = false

[[variable]]
name = "settings"
type = """
object({
  name    = optional(string, null)
  size    = optional(number, 3)
  enabled = bool
  ports   = list(object({ port = number, proto = optional(string, "tcp") }))
})
"""
default = '{ enabled = true, ports = [] }'

[[variable]]
name = "zones"
type = "set(string)"
default = '["a", "b"]'
"#,
    )
    .unwrap();

    let source: String = catalog.iter().map(|s| s.render_stub()).collect();
    let issues = check(&catalog.rules(), &source);
    assert!(issues.is_empty(), "{source}\n{issues:?}");
}

/// Hands out module content but refuses every issue.
struct RefusingRunner<'m> {
    inner: ModuleRunner<'m>,
    attempts: usize,
}

impl Runner for RefusingRunner<'_> {
    fn module_path(&self) -> Result<ModulePath, HostError> {
        self.inner.module_path()
    }

    fn module_content(&self, schema: &BodySchema) -> Result<Vec<ContentBlock>, HostError> {
        self.inner.module_content(schema)
    }

    fn emit_issue(
        &mut self,
        _rule: &dyn Rule,
        _message: String,
        _range: SourceRange,
    ) -> Result<(), HostError> {
        self.attempts += 1;
        Err(HostError::Emit("sink closed".to_string()))
    }
}

#[test]
fn emission_failure_stops_the_check() {
    let module = SourceModule::from_sources(
        ModulePath::root(),
        [(
            "main.tf",
            "variable \"kind\" {\n  type     = number\n  default  = 1\n  nullable = true\n}\n",
        )],
    )
    .unwrap();
    let mut runner = RefusingRunner {
        inner: ModuleRunner::new(&module),
        attempts: 0,
    };
    let err = VariableRule::new(kind()).check(&mut runner).unwrap_err();
    assert!(matches!(err, RuleError::Host(HostError::Emit(_))));
    assert_eq!(runner.attempts, 1);
}

#[test]
fn issues_point_at_their_attributes() {
    let source = "variable \"kind\" {\n  type     = number\n  default  = \"foo\"\n  nullable = true\n}\n";
    let issues = check(&[VariableRule::new(kind())], source);
    let texts: Vec<&str> = issues
        .iter()
        .map(|i| &source[i.range.span.range()])
        .collect();
    assert_eq!(texts, vec!["type     = number", "nullable = true"]);
    assert!(issues.iter().all(|i| i.range.filename == "main.tf"));
}
