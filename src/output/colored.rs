//! Colored formatter implementation with terminal color support
//!
//! Cells are laid out exactly as [`PlainFormatter`] lays them out, then
//! painted by grade.

use super::formatter::{
    align_text, bordered_row, column_widths, fmt_error, horizontal_border, report_columns,
    report_row, summary_lines, Alignment, ReportFormatter, RowData, Tone,
};
use super::ranking::Ranking;
use crate::{config::privacy::PRIVACY_FRIENDLY_THRESHOLD, error::Result, models::ScoredResult};
use colored::*;
use std::fmt::Write as _;

/// Quality grade used to pick a cell color
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
    /// No data to grade
    Missing,
}

impl Grade {
    /// Composite score, higher is better
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 60.0 {
            Self::Good
        } else if score >= 40.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// Region rating, higher is better
    pub fn from_rating(rating: Option<u8>) -> Self {
        match rating {
            Some(r) if r >= PRIVACY_FRIENDLY_THRESHOLD => Self::Excellent,
            Some(r) if r >= 60 => Self::Good,
            Some(r) if r >= 40 => Self::Fair,
            Some(_) => Self::Poor,
            None => Self::Missing,
        }
    }

    /// Mean latency; anything at or above 100ms is left uncolored
    pub fn from_latency(latency_ms: Option<f64>) -> Self {
        match latency_ms {
            Some(ms) if ms < 50.0 => Self::Excellent,
            Some(ms) if ms < 100.0 => Self::Good,
            Some(_) => Self::Fair,
            None => Self::Poor,
        }
    }

    /// Jitter standard deviation
    pub fn from_jitter(std_dev: Option<f64>) -> Self {
        match std_dev {
            Some(sd) if sd < 10.0 => Self::Excellent,
            Some(sd) if sd < 30.0 => Self::Fair,
            Some(_) => Self::Poor,
            None => Self::Missing,
        }
    }

    /// Loss as a percentage
    pub fn from_loss_percent(percent: f64) -> Self {
        if percent == 0.0 {
            Self::Excellent
        } else if percent < 5.0 {
            Self::Good
        } else if percent < 25.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    /// Get color for this grade
    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::BrightGreen,
            Self::Good => Color::Green,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Red,
            Self::Missing => Color::BrightBlack,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::BrightCyan,
            success: Color::BrightGreen,
            warning: Color::Yellow,
            error: Color::Red,
            info: Color::BrightCyan,
        }
    }
}

/// Colored formatter implementation
#[derive(Debug, Clone, Default)]
pub struct ColoredFormatter {
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(color_scheme: ColorScheme) -> Self {
        Self { color_scheme }
    }

    fn tone_color(&self, tone: Tone) -> Color {
        match tone {
            Tone::Info => self.color_scheme.info,
            Tone::Good => self.color_scheme.success,
            Tone::Bad => self.color_scheme.error,
            Tone::Warning => self.color_scheme.warning,
        }
    }

    /// Color for each cell of a result's row; `None` leaves the cell plain
    fn cell_colors(&self, result: &ScoredResult) -> [Option<Color>; 7] {
        let stats = &result.statistics;
        let latency = Grade::from_latency(stats.mean_latency_ms);
        let status = if result.responded() {
            self.color_scheme.success
        } else {
            self.color_scheme.error
        };

        [
            None,
            Some(Grade::from_rating(result.region_rating).color()),
            Some(Grade::from_score(result.composite_score).color()),
            (latency != Grade::Fair).then(|| latency.color()),
            Some(Grade::from_jitter(stats.jitter_std_dev()).color()),
            Some(Grade::from_loss_percent(stats.loss_percent()).color()),
            Some(status),
        ]
    }
}

impl ReportFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.len() + 4);

        writeln!(output, "{}", border.color(self.color_scheme.header)).map_err(fmt_error)?;
        writeln!(output, "  {}  ", title.bold().color(self.color_scheme.header)).map_err(fmt_error)?;
        write!(output, "{}", border.color(self.color_scheme.header)).map_err(fmt_error)?;

        Ok(output)
    }

    fn format_table(&self, ranking: &Ranking) -> Result<String> {
        if ranking.ordered.is_empty() {
            return Ok("No results available.".bright_black().to_string());
        }

        let columns = report_columns();
        let rows: Vec<RowData> = ranking.ordered.iter().map(report_row).collect();
        let widths = column_widths(&columns, &rows);
        let border = horizontal_border(&widths).bright_black().to_string();

        let mut output = String::new();
        writeln!(output, "{}", border).map_err(fmt_error)?;
        let header = columns.iter().zip(&widths).map(|(column, &width)| {
            align_text(column.header, width, Alignment::Left)
                .bold()
                .color(self.color_scheme.header)
                .to_string()
        });
        writeln!(output, "{}", bordered_row(header)).map_err(fmt_error)?;
        writeln!(output, "{}", border).map_err(fmt_error)?;

        for (result, row) in ranking.ordered.iter().zip(&rows) {
            let colors = self.cell_colors(result);
            let cells = row.iter().enumerate().map(|(idx, cell)| {
                let padded = align_text(cell, widths[idx], columns[idx].alignment);
                match colors[idx] {
                    Some(color) => padded.color(color).to_string(),
                    None => padded,
                }
            });
            writeln!(output, "{}", bordered_row(cells)).map_err(fmt_error)?;
        }
        write!(output, "{}", border).map_err(fmt_error)?;

        Ok(output)
    }

    fn format_summary(&self, ranking: &Ranking) -> Result<String> {
        let mut output = String::new();
        for line in summary_lines(ranking) {
            writeln!(output, "{}", line.text.color(self.tone_color(line.tone))).map_err(fmt_error)?;
        }
        Ok(output.trim_end().to_string())
    }

    fn format_warning(&self, warning: &str) -> String {
        format!("Warning: {}", warning).color(self.color_scheme.warning).to_string()
    }

    fn format_success(&self, message: &str) -> String {
        message.color(self.color_scheme.success).to_string()
    }
}
