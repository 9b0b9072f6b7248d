//! Show how a workload state is discretized and costed

use anyhow::Result;
use colored::Colorize;
use scaler_lib::{
    quantity::format_quantity,
    reinforcement::{QLearning, RlState},
};
use serde::Serialize;
use std::path::Path;

use super::{read_parameters, read_state};
use crate::output::{format_percentage, print_json, OutputFormat};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuantizedState {
    #[serde(flatten)]
    state: RlState,
    #[serde(with = "scaler_lib::quantity::serde_quantity")]
    cost: scaler_lib::decimal::Quantity,
}

pub fn quantize(state: &Path, parameters: Option<&Path>, format: OutputFormat) -> Result<()> {
    let state = read_state(state)?;
    let parameters = read_parameters(parameters)?;

    let rl_state = RlState::from_state(&state)?;
    let cost = QLearning::new(parameters).evaluate_cost(&rl_state)?;

    match format {
        OutputFormat::Json => print_json(&QuantizedState {
            state: rl_state,
            cost,
        })?,
        OutputFormat::Table => {
            println!("{}", "Quantized State".bold());
            println!("{}", "=".repeat(50));
            println!("Name:                   {}", rl_state.name.cyan());
            println!("Replicas:               {}", rl_state.replicas);
            println!(
                "Requests:               {} / {}",
                format_quantity(&rl_state.cpu_requests),
                format_quantity(&rl_state.memory_requests)
            );
            println!(
                "CPU utilization:        {} (target {})",
                format_percentage(&rl_state.cpu_utilization),
                format_percentage(&rl_state.cpu_target_utilization)
            );
            println!(
                "Memory utilization:     {} (target {})",
                format_percentage(&rl_state.memory_utilization),
                format_percentage(&rl_state.memory_target_utilization)
            );
            println!();
            println!("{} {}", "Cost:".bold(), format_quantity(&cost).yellow().bold());
        }
    }

    Ok(())
}
