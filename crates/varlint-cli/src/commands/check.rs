use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::info;

use varlint_kernel::runner::{LoadError, discover_modules};
use varlint_kernel::{ModuleRunner, Rule, RuleError, Severity, SourceModule};

use crate::cli_args::Format;
use crate::report::{self, ModuleReport};

use super::load_catalog;

/// What a completed check found.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Clean,
    /// At least one error-severity issue was reported.
    Failed,
}

/// Run `varlint check`: every enabled rule against every module under `dir`.
pub(crate) fn run(
    config: Option<&Path>,
    dir: &Path,
    recursive: bool,
    format: Format,
    out: &mut impl Write,
) -> Result<Outcome> {
    let catalog = load_catalog(config, dir)?;
    let rules = catalog.rules();
    info!(rules = rules.len(), dir = %dir.display(), "checking");

    let mut reports = Vec::new();
    for (module_dir, path) in discover_modules(dir, recursive)? {
        let module = match SourceModule::load(&module_dir, path) {
            Ok(module) => module,
            Err(LoadError::Parse {
                filename,
                text,
                errors,
            }) => {
                let name = module_dir.join(&filename).display().to_string();
                for error in &errors {
                    report::source_error(&name, &text, error.span, &error.message);
                }
                return Err(anyhow!("failed to parse {name}"));
            }
            Err(err) => return Err(err.into()),
        };

        let mut runner = ModuleRunner::new(&module);
        for rule in &rules {
            if let Err(err) = rule.check(&mut runner) {
                render_rule_error(&module, &err);
                return Err(err).with_context(|| format!("rule {} failed", rule.name()));
            }
        }
        let issues = runner.into_issues();
        reports.push(ModuleReport { module, issues });
    }

    match format {
        Format::Human => report::human(&reports, out)?,
        Format::Json => report::json(&reports, out)?,
    }

    let failed = reports
        .iter()
        .flat_map(|r| &r.issues)
        .any(|issue| issue.severity == Severity::Error);
    Ok(if failed {
        Outcome::Failed
    } else {
        Outcome::Clean
    })
}

fn render_rule_error(module: &SourceModule, err: &RuleError) {
    let (filename, span, message) = match err {
        RuleError::Constraint { filename, source } => {
            (filename, source.span, source.message.clone())
        }
        RuleError::Eval { filename, source } => (filename, source.span(), source.to_string()),
        RuleError::Host(_) => return,
    };
    let Some(file) = module.file(filename) else {
        return;
    };
    let name = match module.dir() {
        Some(dir) => dir.join(filename).display().to_string(),
        None => filename.clone(),
    };
    report::source_error(&name, &file.text, span, &message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CATALOG: &str = r#"
[[variable]]
name = "kind"
type = "string"
default = '"foo"'
nullable = false
link = "https://example.com/kind"

[[variable]]
name = "region"
type = "string"
severity = "warning"
"#;

    fn workspace(main_tf: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".varlint.toml"), CATALOG).unwrap();
        fs::write(dir.path().join("main.tf"), main_tf).unwrap();
        dir
    }

    #[test]
    fn compliant_module_is_clean() {
        let dir = workspace(
            "variable \"kind\" {\n  type     = string\n  default  = \"foo\"\n  nullable = false\n}\n",
        );
        let mut out = Vec::new();
        let outcome = run(None, dir.path(), false, Format::Json, &mut out).unwrap();
        assert_eq!(outcome, Outcome::Clean);
        assert_eq!(String::from_utf8(out).unwrap().trim(), "[]");
    }

    #[test]
    fn error_issue_fails_the_check() {
        let dir = workspace("variable \"kind\" {\n  type = number\n}\n");
        let mut out = Vec::new();
        let outcome = run(None, dir.path(), false, Format::Json, &mut out).unwrap();
        assert_eq!(outcome, Outcome::Failed);
        let issues: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(issues.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn warnings_alone_do_not_fail() {
        let dir = workspace(
            "variable \"kind\" {\n  type     = string\n  default  = \"foo\"\n  nullable = false\n}\n\
             variable \"region\" {}\n",
        );
        let mut out = Vec::new();
        let outcome = run(None, dir.path(), false, Format::Human, &mut out).unwrap();
        assert_eq!(outcome, Outcome::Clean);
        assert!(String::from_utf8_lossy(&out).contains("`region` variable type not declared"));
    }

    #[test]
    fn child_modules_are_loaded_but_not_checked() {
        let dir = workspace("");
        let child = dir.path().join("modules").join("child");
        fs::create_dir_all(&child).unwrap();
        fs::write(child.join("main.tf"), "variable \"kind\" {}\n").unwrap();

        let mut out = Vec::new();
        let outcome = run(None, dir.path(), true, Format::Json, &mut out).unwrap();
        assert_eq!(outcome, Outcome::Clean);
    }

    #[test]
    fn parse_failure_is_fatal() {
        let dir = workspace("variable \"kind\" {\n");
        let mut out = Vec::new();
        let err = run(None, dir.path(), false, Format::Human, &mut out).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn invalid_declared_type_is_fatal() {
        let dir = workspace("variable \"kind\" {\n  type = strng\n}\n");
        let mut out = Vec::new();
        let err = run(None, dir.path(), false, Format::Human, &mut out).unwrap_err();
        assert!(err.to_string().contains("rule kind failed"));
    }
}
