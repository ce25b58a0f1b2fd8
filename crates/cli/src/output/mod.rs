//! Output formatting utilities
//!
//! Human-readable output is colored with `console`, tables are rendered with
//! `comfy-table` and long operations show an `indicatif` spinner. JSON output
//! is pretty-printed and never colored.

mod formatter;
mod progress;

use bk_core::Defaults;

pub use formatter::Formatter;
pub use progress::ProgressBar;

/// Output configuration derived from CLI flags and config defaults
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable progress spinners
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}

impl OutputConfig {
    /// Merge command-line flags over the `[defaults]` table
    ///
    /// Flags can only switch features off; config values fill in the rest.
    pub fn resolve(mut self, defaults: &Defaults) -> Self {
        self.json |= defaults.output.eq_ignore_ascii_case("json");
        self.no_progress |= !defaults.progress;
        self.no_color |= match defaults.color.as_str() {
            "never" => true,
            "always" => false,
            _ => !console::colors_enabled(),
        };
        self
    }
}
