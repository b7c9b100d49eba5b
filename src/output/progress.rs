//! Batch progress bar

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const COLOR_TEMPLATE: &str = "{spinner:.blue} Testing servers {bar:40.cyan/blue} {pos:>4}/{len:4} [{elapsed_precise}] {msg}";
const PLAIN_TEMPLATE: &str = "Testing servers [{bar:40}] {pos:>4}/{len:4} [{elapsed_precise}] {msg}";

/// Progress bar fed by the orchestrator's `(completed, total)` callback
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    /// Bar drawn to stderr; indicatif hides it when stderr is not a terminal
    pub fn new(total: usize, use_color: bool) -> Self {
        Self::with_bar(ProgressBar::new(total as u64), use_color)
    }

    /// Bar that never draws, for tests and piped output
    pub fn hidden(total: usize) -> Self {
        Self::with_bar(
            ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden()),
            false,
        )
    }

    fn with_bar(bar: ProgressBar, use_color: bool) -> Self {
        let (template, chars) = if use_color {
            (COLOR_TEMPLATE, "■■□")
        } else {
            (PLAIN_TEMPLATE, "=> ")
        };

        // A bad template leaves indicatif's default style in place
        if let Ok(style) = ProgressStyle::with_template(template) {
            bar.set_style(style.progress_chars(chars));
        }
        bar.enable_steady_tick(Duration::from_millis(120));

        Self { bar }
    }

    /// Record that `completed` of `total` hosts are done
    pub fn update(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
    }

    /// Callback suitable for `BatchOrchestrator::run_batch`
    pub fn callback(&self) -> impl FnMut(usize, usize) + '_ {
        move |completed, total| self.update(completed, total)
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Remove the bar before the report is printed
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_follows_callback() {
        let progress = BatchProgress::hidden(3);
        {
            let mut callback = progress.callback();
            callback(1, 3);
            callback(2, 3);
        }
        assert_eq!(progress.position(), 2);

        progress.update(3, 3);
        progress.finish("done");
        assert_eq!(progress.position(), 3);
    }
}
