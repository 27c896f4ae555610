//! Shared output formatting for fitness reports.

use anyhow::Result;
use fitness_import_core::{FileError, FitnessReport, Outcome, RuleOutcome};
use std::fmt::Write;

use crate::OutputFormat;

const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const END: &str = "\x1b[0m";

/// Width of the summary title rule.
const TITLE_WIDTH: usize = 72;

/// Print a report in the specified format.
pub fn print(report: &FitnessReport, format: OutputFormat, color: bool) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_text(report, color)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Compact => print!("{}", render_compact(report)),
    }
    Ok(())
}

/// ANSI styling that collapses to plain text when color is off.
#[derive(Clone, Copy)]
struct Palette {
    enabled: bool,
}

impl Palette {
    fn paint(self, codes: &[&str], text: &str) -> String {
        if self.enabled {
            format!("{}{text}{END}", codes.concat())
        } else {
            text.to_owned()
        }
    }
}

/// Human-readable summary: one line per rule, offending imports under
/// every rule that did not pass cleanly, then unreadable files.
pub fn render_text(report: &FitnessReport, color: bool) -> String {
    let palette = Palette { enabled: color };
    let mut out = String::new();

    let (title, title_color) = if report.failed {
        ("fitness report summary (failed)", RED)
    } else {
        ("fitness report summary (passed)", GREEN)
    };
    let title = format!("{:=^width$}", format!(" {title} "), width = TITLE_WIDTH);
    let _ = writeln!(out, "{}", palette.paint(&[BOLD, title_color], &title));

    if report.outcomes.is_empty() {
        let _ = writeln!(
            out,
            "{}",
            palette.paint(
                &[GREEN],
                "No warnings to report on. Use [[fitness_warnings]] in fitness-import.toml to configure some"
            )
        );
    }

    for (key, outcome) in &report.outcomes {
        let _ = writeln!(out, "{}", rule_line(key, outcome, palette));
        if outcome.outcome != Outcome::Success {
            for record in &outcome.matches {
                let _ = writeln!(out, "    {}", record.detail);
            }
        }
    }

    if !report.errors.is_empty() {
        let _ = writeln!(out);
        let header = format!("Could not analyze {} file(s):", report.errors.len());
        let _ = writeln!(out, "{}", palette.paint(&[YELLOW, BOLD], &header));
        for error in &report.errors {
            let _ = writeln!(out, "    {error}");
        }
    }

    let _ = writeln!(
        out,
        "\nAnalyzed {} file(s), {} restricted import(s) across {} rule(s)",
        report.files_analyzed,
        report.total_count(),
        report.outcomes.len()
    );

    out
}

fn rule_line(key: &str, outcome: &RuleOutcome, palette: Palette) -> String {
    let had = palette.paint(&[BOLD], &format!("Had {} occurrences", outcome.count));
    let allowed = outcome.rule.allowed_number;
    match outcome.outcome {
        Outcome::Fail => format!(
            "{key}: {had}{}",
            palette.paint(&[RED, BOLD], &format!(", was allowed {allowed}"))
        ),
        Outcome::Report => palette.paint(&[BLUE], &format!("{key}: {had}")),
        Outcome::Success => format!(
            "{key}: {had}{}",
            palette.paint(&[GREEN, BOLD], &format!(", is allowed {allowed}"))
        ),
    }
}

/// One line per offending import, then one per unreadable file.
pub fn render_compact(report: &FitnessReport) -> String {
    let mut out = String::new();
    for outcome in report.outcomes.values() {
        for record in &outcome.matches {
            let d = &record.declaration;
            let _ = writeln!(
                out,
                "{}:{}: [{}] {}: {} {}",
                d.file.display(),
                d.line,
                outcome.outcome,
                record.rule,
                d.form,
                d.name,
            );
        }
    }
    for error in &report.errors {
        match error {
            FileError::Parse {
                path,
                line,
                message,
            } => {
                let _ = writeln!(out, "{}:{line}: [error] {message}", path.display());
            }
            FileError::Io { path, message } => {
                let _ = writeln!(out, "{}: [error] {message}", path.display());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitness_import_core::{
        build_report, ImportDeclaration, ImportForm, MatchRecord, RuleEntry, RuleSet,
    };
    use std::path::Path;

    fn sample() -> FitnessReport {
        let rules = RuleSet::from_entries(
            [
                RuleEntry::new("legacy").allowed_number(0),
                RuleEntry::new("requests").restriction_type("report"),
                RuleEntry::new("django.db").allowed_number(3),
            ],
            Path::new("."),
        )
        .unwrap();
        let matches = vec![
            MatchRecord::new(
                "legacy",
                ImportDeclaration::new("app/views.py", 3, "legacy.old", ImportForm::Import),
            ),
            MatchRecord::new(
                "requests",
                ImportDeclaration::new("app/api.py", 1, "requests", ImportForm::Import),
            ),
            MatchRecord::new(
                "django.db",
                ImportDeclaration::new("app/models.py", 2, "django.db", ImportForm::From),
            ),
        ];
        let errors = vec![FileError::Parse {
            path: "scripts/broken.py".into(),
            line: 3,
            message: "invalid syntax".into(),
        }];
        build_report(&rules, matches, errors, 3)
    }

    #[test]
    fn compact_output() {
        insta::assert_snapshot!(render_compact(&sample()), @r"
        app/models.py:2: [success] django.db: from django.db
        app/views.py:3: [fail] legacy: import legacy.old
        app/api.py:1: [report] requests: import requests
        scripts/broken.py:3: [error] invalid syntax
        ");
    }

    #[test]
    fn text_output_without_color() {
        let text = render_text(&sample(), false);
        assert!(text.contains("fitness report summary (failed)"));
        assert!(text.contains("legacy: Had 1 occurrences, was allowed 0"));
        assert!(text.contains("    import legacy.old in app/views.py line 3"));
        assert!(text.contains("django.db: Had 1 occurrences, is allowed 3"));
        assert!(text.contains("requests: Had 1 occurrences\n"));
        assert!(text.contains("    import requests in app/api.py line 1"));
        assert!(!text.contains("from django.db import in"));
        assert!(text.contains("Could not analyze 1 file(s):"));
        assert!(text.contains("syntax error in scripts/broken.py at line 3"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn text_output_with_color() {
        let text = render_text(&sample(), true);
        assert!(text.contains(RED));
        assert!(text.contains(END));
    }

    #[test]
    fn empty_report_hints_at_configuration() {
        let text = render_text(&FitnessReport::default(), false);
        assert!(text.contains("fitness report summary (passed)"));
        assert!(text.contains("No warnings to report on"));
    }

    #[test]
    fn json_is_structured() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["failed"], true);
        assert_eq!(json["outcomes"]["legacy"]["count"], 1);
        assert_eq!(json["outcomes"]["legacy"]["outcome"], "fail");
        assert_eq!(json["outcomes"]["requests"]["rule"]["restriction_type"], "report");
        assert_eq!(json["errors"][0]["kind"], "parse");
    }
}
