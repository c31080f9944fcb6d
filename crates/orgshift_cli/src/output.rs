//! Operator-facing terminal output.

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use owo_colors::OwoColorize;
use serde::Serialize;

/// Writes results for the operator. Results go to stdout, errors to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output that prints machine-readable JSON reports instead of text.
    pub fn json() -> Self {
        Self { json: true }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".bright_green(), message);
    }

    pub fn info(&self, label: &str, message: &str) {
        println!("{} {}", label.bright_cyan(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", "⚠".yellow(), message.yellow());
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".bright_red(), message.bright_red());
    }

    pub fn status(&self, message: &str) {
        println!("  {}", message.dimmed());
    }

    pub fn section(&self, title: &str) {
        println!();
        println!("{}", title.bold().underline());
    }

    pub fn list_item(&self, message: &str) {
        println!("  • {}", message);
    }

    pub fn kv(&self, key: &str, value: &str) {
        println!("  {} {}", format!("{key}:").bright_black(), value);
    }

    pub fn print(&self, message: &str) {
        println!("{}", message);
    }

    pub fn table(&self, table: &Table) {
        println!("{table}");
    }

    /// Pretty-printed JSON document on stdout.
    pub fn report<T: Serialize>(&self, value: &T) -> miette::Result<()> {
        let rendered = serde_json::to_string_pretty(value)
            .map_err(|e| miette::miette!("Failed to render report: {}", e))?;
        println!("{rendered}");
        Ok(())
    }
}

/// Table with the shared look used by every report.
pub fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().copied());
    table
}
