//! Table output formatting for CLI commands
//!
//! Renders repair histories and batch summaries using comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use crate::domain::models::{RepairAttempt, RepairOutcome};

/// One row of the batch summary table.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchRow {
    pub test_file: String,
    /// `None` when the session could not run.
    pub outcome: Option<RepairOutcome>,
    pub attempts: u32,
    pub detail: String,
}

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format a repair history, one row per attempt
    pub fn format_history(&self, history: &[RepairAttempt]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&[
            "#", "Category", "Strategy", "Before", "After", "Diff", "Reverted",
        ]));

        for attempt in history {
            let strategy = if attempt.strategy == attempt.selected_strategy {
                attempt.strategy.to_string()
            } else {
                format!("{} -> {}", attempt.selected_strategy, attempt.strategy)
            };

            let after_cell = Cell::new(attempt.errors_after);
            let after_cell = if !self.use_colors {
                after_cell
            } else if attempt.errors_after == 0 {
                after_cell.fg(Color::Green)
            } else if attempt.errors_after > attempt.errors_before {
                after_cell.fg(Color::Red)
            } else {
                after_cell
            };

            table.add_row(vec![
                Cell::new(attempt.iteration + 1),
                Cell::new(attempt.category),
                Cell::new(strategy),
                Cell::new(attempt.errors_before),
                after_cell,
                Cell::new(attempt.diff_size),
                Cell::new(if attempt.reverted { "yes" } else { "-" }),
            ]);
        }

        table.to_string()
    }

    /// Format batch results, one row per file
    pub fn format_batch(&self, rows: &[BatchRow]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Test file", "Outcome", "Attempts", "Detail"]));

        for row in rows {
            let outcome_cell = match row.outcome {
                Some(outcome) if self.use_colors => {
                    Cell::new(outcome).fg(outcome_color(outcome))
                }
                Some(outcome) => Cell::new(format!("{} {outcome}", outcome_icon(outcome))),
                None if self.use_colors => Cell::new("error").fg(Color::Red),
                None => Cell::new("✗ error"),
            };

            table.add_row(vec![
                Cell::new(&row.test_file),
                outcome_cell,
                Cell::new(row.attempts),
                Cell::new(super::truncate(&row.detail, 60)),
            ]);
        }

        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| Cell::new(title).add_attribute(Attribute::Bold))
        .collect()
}

/// Check if color output is supported
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    // Check for dumb terminal
    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

/// Map repair outcome to color
pub const fn outcome_color(outcome: RepairOutcome) -> Color {
    match outcome {
        RepairOutcome::Passed => Color::Green,
        RepairOutcome::Exhausted | RepairOutcome::NoProgress => Color::Yellow,
        RepairOutcome::Stuck => Color::Magenta,
        RepairOutcome::Unfixable => Color::Red,
    }
}

/// Map repair outcome to icon
pub const fn outcome_icon(outcome: RepairOutcome) -> &'static str {
    match outcome {
        RepairOutcome::Passed => "✓",
        RepairOutcome::Stuck => "⟳",
        RepairOutcome::Unfixable => "✗",
        RepairOutcome::NoProgress => "⊘",
        RepairOutcome::Exhausted => "⧗",
    }
}
