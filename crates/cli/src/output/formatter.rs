//! Output formatter for human-readable and JSON output
//!
//! Every command prints through a `Formatter` so quiet, JSON and color
//! settings apply uniformly.

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use console::style;
use serde::Serialize;

use super::OutputConfig;

/// Formatter for CLI output
///
/// In JSON mode all stdout output is strict JSON without colors or progress.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn is_json(&self) -> bool {
        self.config.json
    }

    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Output a success message (human mode only)
    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        let mark = style("✓").green().force_styling(self.colors_enabled());
        println!("{mark} {message}");
    }

    /// Output an error message
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({ "error": message });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string())
            );
            return;
        }
        let mark = style("✗").red().force_styling(self.colors_enabled());
        eprintln!("{mark} {message}");
    }

    pub fn warning(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        let mark = style("⚠").yellow().force_styling(self.colors_enabled());
        eprintln!("{mark} {message}");
    }

    /// Pretty-print a value as JSON regardless of mode
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }

    /// Dim secondary text such as sizes and dates
    pub fn dim(&self, text: &str) -> String {
        style(text)
            .dim()
            .force_styling(self.colors_enabled())
            .to_string()
    }

    /// Highlight a name such as a bucket or key
    pub fn accent(&self, text: &str) -> String {
        style(text)
            .cyan()
            .bold()
            .force_styling(self.colors_enabled())
            .to_string()
    }

    /// Build an empty table with the shared style and the given header
    pub fn table(&self, header: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(header.to_vec());
        if !self.colors_enabled() {
            table.force_no_tty();
        }
        table
    }

    /// Print a table (respects quiet mode)
    pub fn print_table(&self, table: &Table) {
        if self.config.quiet {
            return;
        }
        println!("{table}");
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}
