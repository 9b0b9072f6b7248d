//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use scaler_lib::{decimal::Quantity, quantity::format_quantity, Action, ResourcesList};
use serde::{Deserialize, Serialize};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print any value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// `cpu / memory` as plain decimals
pub fn format_resources(list: &ResourcesList) -> String {
    format!(
        "{} / {}",
        format_quantity(&list.cpu),
        format_quantity(&list.memory)
    )
}

/// Format a utilization ratio as percentage
pub fn format_percentage(ratio: &Quantity) -> String {
    let percent = (ratio * Quantity::from(100)).with_scale(1);
    format!("{}%", percent)
}

/// Color an action by the direction it scales in
pub fn color_action(action: Action) -> String {
    let name = action.as_str();
    match action {
        Action::Horizontal => name.cyan().to_string(),
        Action::Vertical => name.magenta().to_string(),
        Action::Hybrid => name.green().to_string(),
        Action::HybridInverse => name.yellow().to_string(),
        Action::None => name.dimmed().to_string(),
    }
}

/// Highlight a cost estimate, bold green when it is the lowest of its row
pub fn color_cost(value: &Quantity, best: bool) -> String {
    let formatted = format_quantity(value);
    if best {
        formatted.green().bold().to_string()
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaler_lib::decimal::dec;

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(&dec(75, 2)), "75.0%");
        assert_eq!(format_percentage(&dec(6, 0)), "600.0%");
    }

    #[test]
    fn test_format_resources() {
        let list = ResourcesList::new(dec(150, 3), dec(268435456, 0));
        assert_eq!(format_resources(&list), "0.15 / 268435456");
    }

    #[test]
    fn test_format_from_json() {
        let format: OutputFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, OutputFormat::Json);
    }
}
