//! Spinner for long-running requests
//!
//! The facade reports no byte-level progress, so transfers show an
//! indeterminate spinner with a message instead of a bar.

use std::time::Duration;

use indicatif::ProgressStyle;

use super::OutputConfig;

/// Spinner wrapper
///
/// Suppressed in quiet, JSON or no-progress mode.
#[derive(Debug)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Start a spinner with the given message
    pub fn spinner(config: &OutputConfig, message: &str) -> Self {
        if config.quiet || config.json || config.no_progress {
            return Self { bar: None };
        }

        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar = indicatif::ProgressBar::new_spinner();
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar: Some(bar) }
    }

    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        self.finish_and_clear();
    }
}
