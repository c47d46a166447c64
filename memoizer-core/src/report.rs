//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs

use crate::edit::TextEdit;
use crate::error::FunctionFailure;
use crate::sequencer::{RewrittenFunction, UnitRewrite};
use serde::{Deserialize, Serialize};

/// Outcome of rewriting one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FileReport {
    pub file: String,
    pub rewritten: Vec<RewrittenReport>,
    pub failures: Vec<FailureReport>,
    /// Applied edits, with offsets into the original file
    pub edits: Vec<TextEdit>,
    /// The rewritten file contents
    #[serde(skip)]
    pub patched: String,
}

/// A function that was rewritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewrittenReport {
    pub function: String,
    pub line: u32,
    pub mangled_name: String,
}

/// A tagged function that was left untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub function: String,
    pub line: u32,
    /// Stable failure identifier, e.g. `name_collision`
    pub kind: String,
    pub message: String,
}

impl From<RewrittenFunction> for RewrittenReport {
    fn from(function: RewrittenFunction) -> Self {
        RewrittenReport {
            function: function.name,
            line: function.line,
            mangled_name: function.mangled_name,
        }
    }
}

impl From<FunctionFailure> for FailureReport {
    fn from(failure: FunctionFailure) -> Self {
        FailureReport {
            function: failure.error.function().to_string(),
            line: failure.line,
            kind: failure.error.kind().to_string(),
            message: failure.error.to_string(),
        }
    }
}

impl FileReport {
    pub fn new(file: String, rewrite: UnitRewrite) -> Self {
        FileReport {
            file,
            rewritten: rewrite.rewritten.into_iter().map(Into::into).collect(),
            failures: rewrite.failures.into_iter().map(Into::into).collect(),
            edits: rewrite.edits,
            patched: rewrite.patched,
        }
    }

    /// Whether the rewrite changed the file
    pub fn is_changed(&self) -> bool {
        !self.edits.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Sort reports deterministically by file path
pub fn sort_reports(mut reports: Vec<FileReport>) -> Vec<FileReport> {
    reports.sort_by(|a, b| a.file.cmp(&b.file));
    reports
}

/// One printable row per tagged function
struct Row<'a> {
    file: &'a str,
    line: u32,
    function: &'a str,
    outcome: String,
}

fn rows(report: &FileReport) -> Vec<Row<'_>> {
    let rewritten = report.rewritten.iter().map(|r| Row {
        file: &report.file,
        line: r.line,
        function: &r.function,
        outcome: format!("rewritten -> {}", r.mangled_name),
    });
    let failed = report.failures.iter().map(|f| Row {
        file: &report.file,
        line: f.line,
        function: &f.function,
        outcome: format!("{}: {}", f.kind, f.message),
    });

    let mut rows: Vec<Row<'_>> = rewritten.chain(failed).collect();
    rows.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.function.cmp(b.function)));
    rows
}

/// Render reports as text output
pub fn render_text(reports: &[FileReport]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<30} {:<6} {:<24} {}\n",
        "FILE", "LINE", "FUNCTION", "RESULT"
    ));

    for report in reports {
        for row in rows(report) {
            output.push_str(&format!(
                "{} {:<6} {} {}\n",
                truncate_or_pad(row.file, 30),
                row.line,
                truncate_or_pad(row.function, 24),
                row.outcome,
            ));
        }
    }

    let rewritten: usize = reports.iter().map(|r| r.rewritten.len()).sum();
    let failed: usize = reports.iter().map(|r| r.failures.len()).sum();
    let changed = reports.iter().filter(|r| r.is_changed()).count();
    output.push_str(&format!(
        "\n{} function(s) rewritten, {} failed, {} of {} file(s) changed\n",
        rewritten,
        failed,
        changed,
        reports.len()
    ));

    output
}

/// Render reports as JSON output
pub fn render_json(reports: &[FileReport]) -> String {
    serde_json::to_string_pretty(reports).unwrap_or_else(|_| "[]".to_string())
}

/// Render the rewritten sources
///
/// A single file is printed as-is; several files are each preceded by a
/// `==> path <==` header line.
pub fn render_source(reports: &[FileReport]) -> String {
    if let [only] = reports {
        return only.patched.clone();
    }

    let mut output = String::new();
    for (index, report) in reports.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        output.push_str(&format!("==> {} <==\n", report.file));
        output.push_str(&report.patched);
        if !report.patched.ends_with('\n') {
            output.push('\n');
        }
    }
    output
}

/// Truncate or pad string to fixed width
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}
