//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use switchtest_common::{DetailedReport, FlattenedReport, FlattenedRow, Judgement};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

impl TableDisplay for FlattenedRow {
    fn headers() -> Vec<&'static str> {
        vec!["Test", "Verdict"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.label.clone(), self.verdict.to_string()]
    }
}

/// One sub-test of a detailed report, for display
#[derive(Debug, Clone, Serialize)]
pub struct DetailRow {
    pub group: String,
    pub sub_test: String,
    pub result: String,
    pub detail: String,
}

impl TableDisplay for DetailRow {
    fn headers() -> Vec<&'static str> {
        vec!["Group", "Sub-test", "Result", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.group.clone(),
            self.sub_test.clone(),
            self.result.clone(),
            self.detail.clone(),
        ]
    }
}

/// Detailed report as display rows, groups and sub-tests in key order
pub fn detail_rows(report: &DetailedReport) -> Vec<DetailRow> {
    report
        .groups
        .iter()
        .flat_map(|(group, tests)| {
            tests.iter().map(move |(name, result)| DetailRow {
                group: group.clone(),
                sub_test: name.clone(),
                result: result.result.as_str().to_string(),
                detail: result.detail.clone(),
            })
        })
        .collect()
}

/// Render a list of items
pub fn render_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                return "No items found.".to_string();
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }

            table.to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(items).unwrap_or_default(),
        OutputFormat::Plain => items
            .iter()
            .map(|item| item.row().join(","))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    println!("{}", render_list(items, format));
}

/// Print a flattened report
pub fn print_flattened(report: &FlattenedReport, format: OutputFormat) {
    print_list(&report.rows, format);
}

#[derive(Serialize)]
struct JudgementOutput<'a> {
    model: &'a str,
    #[serde(flatten)]
    judgement: &'a Judgement,
}

/// Render a judgement: the headline, then failed and missing groups when verbose
pub fn render_judgement(
    judgement: &Judgement,
    model: &str,
    format: OutputFormat,
    verbose: bool,
) -> String {
    if format == OutputFormat::Json {
        let output = JudgementOutput { model, judgement };
        return serde_json::to_string_pretty(&output).unwrap_or_default();
    }

    let verdict = judgement.verdict.to_string();
    let verdict = if judgement.passed() {
        verdict.green().bold()
    } else {
        verdict.red().bold()
    };
    let mut lines = vec![format!("{}: {} {}", judgement.profile, model, verdict)];

    if verbose {
        if !judgement.failures.is_empty() {
            lines.push("FAILED TESTS:".to_string());
            match format {
                OutputFormat::Table => lines.push(render_list(&judgement.failures, format)),
                _ => lines.extend(
                    judgement
                        .failures
                        .iter()
                        .map(|row| format!("{},{}", row.label, row.verdict)),
                ),
            }
        }
        if !judgement.not_found.is_empty() {
            lines.push("NOT FOUND:".to_string());
            lines.extend(judgement.not_found.iter().cloned());
        }
    }

    lines.join("\n")
}

/// Print a judgement
pub fn print_judgement(judgement: &Judgement, model: &str, format: OutputFormat, verbose: bool) {
    println!("{}", render_judgement(judgement, model, format, verbose));
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}
