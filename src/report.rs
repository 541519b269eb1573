//! Report rendering for a finished comparison.
//!
//! The text layout pads every cell except the last one in a line to its column's
//! display width plus one space, so wide names and non-ASCII identifiers stay aligned.

use crate::error::{DbError, DbResult};
use crate::models::{ComparisonOutcome, TableDiff, TableFailure};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

/// Output format for the comparison report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Aligned plain-text columns (default)
    #[default]
    Text,
    /// Markdown pipe table
    Markdown,
    /// JSON document
    Json,
}

/// A comparison outcome together with the names of the two databases.
#[derive(Debug, Clone)]
pub struct Report {
    pub source_name: String,
    pub destination_name: String,
    pub outcome: ComparisonOutcome,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    source: &'a str,
    destination: &'a str,
    tables: &'a [TableDiff],
    failures: &'a [TableFailure],
}

impl Report {
    pub fn new(
        source_name: impl Into<String>,
        destination_name: impl Into<String>,
        outcome: ComparisonOutcome,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            destination_name: destination_name.into(),
            outcome,
        }
    }

    pub fn render(&self, format: ReportFormat) -> DbResult<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Markdown => Ok(self.render_markdown()),
            ReportFormat::Json => self.render_json(),
        }
    }

    fn header(&self) -> [String; 4] {
        [
            "Table".to_string(),
            self.source_name.clone(),
            self.destination_name.clone(),
            "Diff".to_string(),
        ]
    }

    fn rows(&self) -> Vec<[String; 4]> {
        self.outcome
            .diffs
            .iter()
            .map(|d| {
                [
                    d.name.to_string(),
                    d.source_row_count.to_string(),
                    d.dest_row_count.to_string(),
                    d.diff().to_string(),
                ]
            })
            .collect()
    }

    pub fn render_text(&self) -> String {
        let header = self.header();
        let rows = self.rows();

        let mut widths: Vec<usize> = header.iter().map(|c| c.width()).collect();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let mut output = String::new();
        for line in std::iter::once(&header).chain(rows.iter()) {
            let last = line.len() - 1;
            for (i, cell) in line.iter().enumerate() {
                output.push_str(cell);
                if i < last {
                    output.push_str(&" ".repeat(widths[i] - cell.width() + 1));
                }
            }
            output.push('\n');
        }

        if !self.outcome.failures.is_empty() {
            output.push_str("\nFailed tables:\n");
            for failure in &self.outcome.failures {
                output.push_str(&format!("{}: {}\n", failure.table, failure.error));
            }
        }

        output
    }

    pub fn render_markdown(&self) -> String {
        let mut output = String::new();

        let header: String = self
            .header()
            .iter()
            .map(|c| format!("| {} ", c))
            .collect::<String>()
            + "|\n";
        output.push_str(&header);
        output.push_str("|---|---:|---:|---:|\n");

        for row in self.rows() {
            let row_str: String = row.iter().map(|c| format!("| {} ", c)).collect::<String>() + "|\n";
            output.push_str(&row_str);
        }

        let table_text = if self.outcome.diffs.len() == 1 {
            "table"
        } else {
            "tables"
        };
        output.push_str(&format!("\n*{} {}*\n", self.outcome.diffs.len(), table_text));

        if !self.outcome.failures.is_empty() {
            output.push_str("\n**Failed tables:**\n\n");
            for failure in &self.outcome.failures {
                output.push_str(&format!("- `{}`: {}\n", failure.table, failure.error));
            }
        }

        output
    }

    pub fn render_json(&self) -> DbResult<String> {
        let doc = JsonReport {
            source: &self.source_name,
            destination: &self.destination_name,
            tables: &self.outcome.diffs,
            failures: &self.outcome.failures,
        };
        serde_json::to_string_pretty(&doc)
            .map_err(|e| DbError::internal(format!("Failed to serialize report: {}", e)))
    }
}
