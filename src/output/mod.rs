//! Output formatting and display system
//!
//! Ranks scored results and renders them as a table plus summary, either
//! colored for the terminal or plain for the results file. Whether color is
//! used is decided once into a [`RenderConfig`] and passed down.

mod colored;
mod formatter;
pub mod progress;
pub mod ranking;

pub use colored::{ColorScheme, ColoredFormatter, Grade};
pub use formatter::{
    align_text, country_cell, report_columns, report_row, summary_lines, Alignment, Column,
    PlainFormatter, ReportFormatter, RowData, SummaryLine, Tone, PRIVACY_STAR,
};
pub use progress::BatchProgress;
pub use ranking::{rank, ExtremePair, Extremes, HostExtreme, Ranking};

use crate::{cli::Cli, error::Result, models::Config};
use std::path::Path;

/// Rendering choices made once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub use_color: bool,
}

impl RenderConfig {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Combine CLI flags, configured preference and terminal capability
    pub fn detect(cli: &Cli, config: &Config) -> Self {
        Self::new(cli.use_colors(config.enable_color))
    }

    /// Formatter matching this configuration
    pub fn formatter(&self) -> Box<dyn ReportFormatter> {
        if self.use_color {
            Box::new(ColoredFormatter::new())
        } else {
            Box::new(PlainFormatter::new())
        }
    }
}

/// Render the complete report for the console
pub fn render_report(ranking: &Ranking, render: RenderConfig) -> Result<String> {
    render.formatter().format_report(ranking)
}

/// Write the uncolored report to `path`
pub fn save_report(ranking: &Ranking, path: &Path) -> Result<()> {
    let mut report = PlainFormatter::new().format_report(ranking)?;
    report.push('\n');
    std::fs::write(path, report)?;
    Ok(())
}
