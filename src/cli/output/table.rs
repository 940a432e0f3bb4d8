//! Table output formatting for CLI commands
//!
//! Renders validation issues and soil analyses with comfy-table.

use crate::domain::errors::ValidationIssue;
use crate::domain::models::{SoilAnalysis, SoilCondition, SoilReading, SoilThresholds};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

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

    /// One row per validation issue, in the order they were found.
    pub fn format_issues(&self, issues: &[ValidationIssue]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Path").add_attribute(Attribute::Bold),
            Cell::new("Kind").add_attribute(Attribute::Bold),
            Cell::new("Problem").add_attribute(Attribute::Bold),
        ]);

        for (index, issue) in issues.iter().enumerate() {
            let kind_cell = if self.use_colors {
                Cell::new(issue.kind()).fg(Color::Red)
            } else {
                Cell::new(issue.kind())
            };
            table.add_row(vec![
                Cell::new(index + 1),
                Cell::new(issue.path()),
                kind_cell,
                Cell::new(issue.to_string()),
            ]);
        }

        table.to_string()
    }

    /// One row per parameter present in `reading`.
    pub fn format_soil_analysis(
        &self,
        thresholds: &SoilThresholds,
        reading: &SoilReading,
        analysis: &SoilAnalysis,
    ) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("Parameter").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
            Cell::new("Range").add_attribute(Attribute::Bold),
            Cell::new("Optimal").add_attribute(Attribute::Bold),
            Cell::new("Condition").add_attribute(Attribute::Bold),
        ]);

        for (&parameter, &value) in &reading.values {
            let threshold = thresholds[parameter];
            let unit = parameter.unit();
            let condition = analysis
                .conditions
                .get(&parameter)
                .copied()
                .unwrap_or_else(|| threshold.classify(value));

            let condition_cell = if self.use_colors {
                Cell::new(condition).fg(condition_color(condition))
            } else {
                Cell::new(condition)
            };

            table.add_row(vec![
                Cell::new(parameter),
                Cell::new(with_unit(value, unit)),
                Cell::new(format!("{} - {}", threshold.min, with_unit(threshold.max, unit))),
                Cell::new(with_unit(threshold.optimal, unit)),
                condition_cell,
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

/// Check if terminal supports colors
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

const fn condition_color(condition: SoilCondition) -> Color {
    match condition {
        SoilCondition::Optimal => Color::Green,
        SoilCondition::Suboptimal => Color::Yellow,
        SoilCondition::Low | SoilCondition::High => Color::Red,
    }
}

fn with_unit(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        value.to_string()
    } else {
        format!("{value} {unit}")
    }
}
