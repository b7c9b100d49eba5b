//! Core formatting traits and implementations
//!
//! This module defines the report formatting interface and provides a
//! plain text implementation with table formatting. The colored formatter
//! reuses the same cells and widths, painting each cell after padding so
//! escape codes never disturb alignment.

use super::ranking::{ExtremePair, Ranking};
use crate::{
    error::{AppError, Result},
    hosts::country_name,
    models::ScoredResult,
};
use std::fmt::Write as _;

/// Star shown next to privacy-friendly regions
pub const PRIVACY_STAR: &str = "★";

/// Main trait for report formatting
pub trait ReportFormatter {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format ranked results as a table
    fn format_table(&self, ranking: &Ranking) -> Result<String>;

    /// Format counts and best/worst lines
    fn format_summary(&self, ranking: &Ranking) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> String;

    /// Format success messages
    fn format_success(&self, message: &str) -> String;

    /// Complete report: header, table and summary
    fn format_report(&self, ranking: &Ranking) -> Result<String> {
        let mut output = String::new();
        output.push_str(&self.format_header("VPN Server Ranking")?);
        output.push_str("\n\n");
        output.push_str(&self.format_table(ranking)?);
        output.push_str("\n\n");
        output.push_str(&self.format_summary(ranking)?);
        Ok(output)
    }
}

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Alignment {
    Left,
    Right,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: &'static str,
    pub alignment: Alignment,
    pub min_width: usize,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// Columns of the ranking table
pub fn report_columns() -> Vec<Column> {
    vec![
        Column { header: "File", alignment: Alignment::Left, min_width: 40 },
        Column { header: "Country", alignment: Alignment::Left, min_width: 25 },
        Column { header: "Score", alignment: Alignment::Right, min_width: 6 },
        Column { header: "Latency (ms)", alignment: Alignment::Right, min_width: 12 },
        Column { header: "Jitter std/mad/range (ms)", alignment: Alignment::Left, min_width: 25 },
        Column { header: "Loss %", alignment: Alignment::Right, min_width: 7 },
        Column { header: "Status", alignment: Alignment::Left, min_width: 15 },
    ]
}

/// Country cell: name, applicable rating and a star for friendly regions
pub fn country_cell(result: &ScoredResult) -> String {
    let name = country_name(result.target.region_tag.as_deref());
    match result.region_rating {
        Some(rating) if rating >= crate::config::privacy::PRIVACY_FRIENDLY_THRESHOLD => {
            format!("{} ({}) {}", name, rating, PRIVACY_STAR)
        }
        Some(rating) => format!("{} ({})", name, rating),
        None => name.to_string(),
    }
}

/// Plain cells for one result, in [`report_columns`] order
pub fn report_row(result: &ScoredResult) -> RowData {
    let stats = &result.statistics;

    let latency = stats
        .mean_latency_ms
        .map(|ms| format!("{:.2}", ms))
        .unwrap_or_else(|| "N/A".to_string());
    let jitter = stats
        .jitter
        .map(|j| format!("{:.2} / {:.2} / {:.2}", j.std_dev, j.mean_abs_dev, j.range))
        .unwrap_or_else(|| "N/A".to_string());

    vec![
        result.id().to_string(),
        country_cell(result),
        format!("{:.1}", result.composite_score),
        latency,
        jitter,
        format!("{:.1}%", stats.loss_percent()),
        result.status().label().to_string(),
    ]
}

/// Width of each column given its header and the plain cells
pub fn column_widths(columns: &[Column], rows: &[RowData]) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            rows.iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| display_width(cell))
                .fold(column.min_width.max(display_width(column.header)), usize::max)
        })
        .collect()
}

/// Number of terminal columns a cell occupies
pub fn display_width(text: &str) -> usize {
    text.chars().count()
}

/// Align text within specified width
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let padding = width.saturating_sub(display_width(text));
    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
    }
}

/// Create horizontal border for table
pub fn horizontal_border(widths: &[usize]) -> String {
    let mut border = String::from("+");
    for &width in widths {
        border.push_str(&"-".repeat(width + 2));
        border.push('+');
    }
    border
}

/// Join already padded cells into a bordered row
pub fn bordered_row<I>(cells: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut row = String::from("|");
    for cell in cells {
        row.push(' ');
        row.push_str(&cell);
        row.push_str(" |");
    }
    row
}

/// How a summary line should be emphasised
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tone {
    Info,
    Good,
    Bad,
    Warning,
}

/// One line of the summary section
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    pub text: String,
    pub tone: Tone,
}

impl SummaryLine {
    fn new(text: String, tone: Tone) -> Self {
        Self { text, tone }
    }
}

/// Counts followed by best/worst lines for every metric with data
pub fn summary_lines(ranking: &Ranking) -> Vec<SummaryLine> {
    let mut lines = vec![
        SummaryLine::new(format!("Total: {} servers", ranking.total()), Tone::Info),
        SummaryLine::new(format!("Successful: {}", ranking.responded), Tone::Good),
        SummaryLine::new(format!("Failed: {}", ranking.unresponsive().len()), Tone::Bad),
    ];

    let dns_failures = ranking.dns_failures();
    if dns_failures > 0 {
        lines.push(SummaryLine::new(format!("  - DNS Resolution Failed: {}", dns_failures), Tone::Bad));
    }
    let other_failures = ranking.other_failures();
    if other_failures > 0 {
        lines.push(SummaryLine::new(format!("  - Other failures: {}", other_failures), Tone::Warning));
    }

    let extremes = &ranking.extremes;
    push_pair(&mut lines, "score", extremes.score.as_ref(), |v| format!("Score: {:.1}", v));
    push_pair(&mut lines, "latency", extremes.latency.as_ref(), |v| format!("{:.2} ms", v));
    push_pair(&mut lines, "jitter", extremes.jitter.as_ref(), |v| format!("std_dev: {:.2} ms", v));
    push_pair(&mut lines, "packet loss", extremes.loss.as_ref(), |v| format!("{:.1}%", v * 100.0));

    if let Some(pair) = extremes.rating.as_ref() {
        for (label, end, tone) in [("Best", &pair.best, Tone::Good), ("Worst", &pair.worst, Tone::Bad)] {
            lines.push(SummaryLine::new(
                format!(
                    "{} privacy: {} ({}, score: {:.0})",
                    label,
                    end.hostname,
                    country_name(end.region_tag.as_deref()),
                    end.value
                ),
                tone,
            ));
        }
    }

    lines
}

fn push_pair<F>(lines: &mut Vec<SummaryLine>, metric: &str, pair: Option<&ExtremePair>, describe: F)
where
    F: Fn(f64) -> String,
{
    if let Some(pair) = pair {
        lines.push(SummaryLine::new(
            format!("Best {}: {} ({})", metric, pair.best.hostname, describe(pair.best.value)),
            Tone::Good,
        ));
        lines.push(SummaryLine::new(
            format!("Worst {}: {} ({})", metric, pair.worst.hostname, describe(pair.worst.value)),
            Tone::Bad,
        ));
    }
}

pub(crate) fn fmt_error(e: std::fmt::Error) -> AppError {
    AppError::internal(format!("Failed to format report: {}", e))
}

/// Plain text formatter implementation
#[derive(Debug, Clone, Default)]
pub struct PlainFormatter;

impl PlainFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);

        writeln!(output, "{}", border).map_err(fmt_error)?;
        writeln!(output, "  {}  ", title).map_err(fmt_error)?;
        write!(output, "{}", border).map_err(fmt_error)?;

        Ok(output)
    }

    fn format_table(&self, ranking: &Ranking) -> Result<String> {
        if ranking.ordered.is_empty() {
            return Ok("No results available.".to_string());
        }

        let columns = report_columns();
        let rows: Vec<RowData> = ranking.ordered.iter().map(report_row).collect();
        let widths = column_widths(&columns, &rows);
        let border = horizontal_border(&widths);

        let mut output = String::new();
        writeln!(output, "{}", border).map_err(fmt_error)?;
        let header = columns
            .iter()
            .zip(&widths)
            .map(|(column, &width)| align_text(column.header, width, Alignment::Left));
        writeln!(output, "{}", bordered_row(header)).map_err(fmt_error)?;
        writeln!(output, "{}", border).map_err(fmt_error)?;

        for row in &rows {
            let cells = row
                .iter()
                .zip(columns.iter().zip(&widths))
                .map(|(cell, (column, &width))| align_text(cell, width, column.alignment));
            writeln!(output, "{}", bordered_row(cells)).map_err(fmt_error)?;
        }
        write!(output, "{}", border).map_err(fmt_error)?;

        Ok(output)
    }

    fn format_summary(&self, ranking: &Ranking) -> Result<String> {
        let mut output = String::new();
        for line in summary_lines(ranking) {
            writeln!(output, "{}", line.text).map_err(fmt_error)?;
        }
        Ok(output.trim_end().to_string())
    }

    fn format_warning(&self, warning: &str) -> String {
        format!("Warning: {}", warning)
    }

    fn format_success(&self, message: &str) -> String {
        message.to_string()
    }
}
