//! Issue and diagnostic rendering.

use std::io::{self, Write};
use std::path::PathBuf;

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use serde::Serialize;
use tracing::warn;

use varlint_kernel::ast::Span;
use varlint_kernel::{Issue, Severity, SourceModule};

/// The issues one module produced, kept with the module for rendering.
pub(crate) struct ModuleReport {
    pub module: SourceModule,
    pub issues: Vec<Issue>,
}

impl ModuleReport {
    fn display_name(&self, filename: &str) -> String {
        match self.module.dir() {
            Some(dir) => dir.join(filename).display().to_string(),
            None => filename.to_string(),
        }
    }
}

fn config() -> Config {
    Config::default().with_index_type(IndexType::Byte)
}

fn report_kind(severity: Severity) -> (ReportKind<'static>, Color) {
    match severity {
        Severity::Error => (ReportKind::Error, Color::Red),
        Severity::Warning => (ReportKind::Warning, Color::Yellow),
        Severity::Notice => (ReportKind::Advice, Color::Cyan),
    }
}

/// Annotated source snippets, one report per issue.
pub(crate) fn human(reports: &[ModuleReport], out: &mut impl Write) -> io::Result<()> {
    for report in reports {
        for issue in &report.issues {
            let Some(file) = report.module.file(&issue.range.filename) else {
                writeln!(out, "{issue}")?;
                continue;
            };
            let name = report.display_name(&file.name);
            let (kind, color) = report_kind(issue.severity);
            let mut message = issue.message.lines();
            let summary = message.next().unwrap_or_default();
            let detail: Vec<&str> = message.filter(|line| !line.is_empty()).collect();

            let mut builder = Report::build(kind, (name.as_str(), issue.range.span.range()))
                .with_config(config())
                .with_code(&issue.rule)
                .with_message(summary)
                .with_label(
                    Label::new((name.as_str(), issue.range.span.range()))
                        .with_message(format!("variable `{}`", issue.rule))
                        .with_color(color),
                );
            if !detail.is_empty() {
                builder = builder.with_note(format!("expected:\n{}", detail.join("\n")));
            }
            if !issue.link.is_empty() {
                builder = builder.with_help(format!("see {}", issue.link));
            }
            builder
                .finish()
                .write((name.as_str(), Source::from(file.text.as_str())), &mut *out)?;
        }
    }
    Ok(())
}

/// An error located in a source file, printed to stderr.
pub(crate) fn source_error(name: &str, text: &str, span: Span, message: &str) {
    let report = Report::build(ReportKind::Error, (name, span.range()))
        .with_config(config())
        .with_message(message)
        .with_label(
            Label::new((name, span.range()))
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish();
    // The caller still reports the error itself if this fails.
    if let Err(err) = report.eprint((name, Source::from(text))) {
        warn!(file = name, error = %err, "could not render diagnostic");
    }
}

#[derive(Serialize)]
struct JsonIssue<'a> {
    rule: &'a str,
    severity: Severity,
    message: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    link: &'a str,
    module: String,
    file: PathBuf,
    start: Position,
    end: Position,
}

#[derive(Serialize)]
struct Position {
    line: usize,
    column: usize,
    byte: usize,
}

/// A JSON array of every issue.
pub(crate) fn json(reports: &[ModuleReport], out: &mut impl Write) -> anyhow::Result<()> {
    let mut issues = Vec::new();
    for report in reports {
        for issue in &report.issues {
            let position = |byte: usize| {
                let (line, column) = report
                    .module
                    .file(&issue.range.filename)
                    .map(|f| f.line_col(byte))
                    .unwrap_or((0, 0));
                Position { line, column, byte }
            };
            issues.push(JsonIssue {
                rule: &issue.rule,
                severity: issue.severity,
                message: &issue.message,
                link: &issue.link,
                module: report.module.path().to_string(),
                file: PathBuf::from(report.display_name(&issue.range.filename)),
                start: position(issue.range.span.start),
                end: position(issue.range.span.end),
            });
        }
    }
    serde_json::to_writer_pretty(&mut *out, &issues)?;
    writeln!(out)?;
    Ok(())
}
