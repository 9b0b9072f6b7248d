//! Learning state inspection

use anyhow::{Context, Result};
use colored::Colorize;
use scaler_lib::{reinforcement::QTableRow, Action, LearningState};
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::output::{color_action, color_cost, print_json, print_warning, OutputFormat};

/// Row for the Q-table: one learning state, one column per action
#[derive(Tabled)]
struct QTableRowView {
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "NONE")]
    none: String,
    #[tabled(rename = "HORIZONTAL")]
    horizontal: String,
    #[tabled(rename = "VERTICAL")]
    vertical: String,
    #[tabled(rename = "HYBRID")]
    hybrid: String,
    #[tabled(rename = "HYBRID_INVERSE")]
    hybrid_inverse: String,
}

impl QTableRowView {
    fn new(state: &str, row: &QTableRow) -> Self {
        let best = row.values().min();
        let cell = |action: Action| match row.get(&action) {
            Some(value) => color_cost(value, Some(value) == best),
            None => "-".dimmed().to_string(),
        };
        Self {
            state: state.to_string(),
            none: cell(Action::None),
            horizontal: cell(Action::Horizontal),
            vertical: cell(Action::Vertical),
            hybrid: cell(Action::Hybrid),
            hybrid_inverse: cell(Action::HybridInverse),
        }
    }
}

/// Print a persisted learning state
pub fn inspect(path: &Path, state_filter: Option<&str>, format: OutputFormat) -> Result<()> {
    let blob = std::fs::read(path)
        .with_context(|| format!("Failed to read learning state {}", path.display()))?;
    let learning = LearningState::decode(&blob)?;

    match format {
        OutputFormat::Json => print_json(&learning)?,
        OutputFormat::Table => {
            let stats = learning.stats();
            println!("{}", "Learning State".bold());
            println!("{}", "=".repeat(50));
            println!("States:                 {}", stats.states);
            println!("Entries:                {}", stats.entries);
            match (&learning.previous_state, learning.previous_action) {
                (Some(state), Some(action)) => {
                    println!("Last state:             {}", state.name.cyan());
                    println!("Last action:            {}", color_action(action));
                }
                _ => println!("Last transition:        {}", "none".dimmed()),
            }
            println!();

            let rows: Vec<QTableRowView> = learning
                .table
                .iter()
                .filter(|(state, _)| state_filter.map_or(true, |filter| state.as_str() == filter))
                .map(|(state, row)| QTableRowView::new(state, row))
                .collect();

            if rows.is_empty() {
                print_warning("No Q-table entries found");
            } else {
                println!("{}", "Expected cost per action (lowest highlighted)".bold());
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
    }

    Ok(())
}
