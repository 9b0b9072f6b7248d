//! Decision commands, remote or in-process

use anyhow::{Context, Result};
use colored::Colorize;
use scaler_lib::{QAgent, ScalingDecision, State};
use serde::Serialize;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

use super::{read_learning_state, read_parameters, read_state};
use crate::client::{ApiClient, DecisionRequest, DecisionResponse};
use crate::output::{color_action, format_resources, print_info, print_json, print_success, OutputFormat};

/// Arguments of `hsctl decide`
pub struct DecideArgs {
    pub workload: String,
    pub state: PathBuf,
    pub learning_state: Option<PathBuf>,
    pub parameters: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub local: bool,
    pub epsilon: f64,
    pub seed: Option<u64>,
}

/// Row for per-container resources table
#[derive(Tabled)]
struct ContainerRow {
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "Requests (cpu / memory)")]
    requests: String,
    #[tabled(rename = "Limits (cpu / memory)")]
    limits: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocalDecision<'a> {
    decision: &'a ScalingDecision,
    state_name: &'a str,
    greedy: bool,
}

/// Ask the service for a decision
pub async fn decide_remote(client: &ApiClient, args: DecideArgs, format: OutputFormat) -> Result<()> {
    let state = read_state(&args.state)?;
    let learning_state = read_learning_state(args.learning_state.as_deref())?;
    let parameters = match &args.parameters {
        Some(path) => Some(read_parameters(Some(path))?),
        None => None,
    };

    let request = DecisionRequest {
        workload: args.workload.clone(),
        state: state.clone(),
        learning_state: if learning_state.is_empty() {
            None
        } else {
            Some(String::from_utf8(learning_state).context("Learning state is not UTF-8")?)
        },
        parameters,
    };

    let response: DecisionResponse = client.post("api/v1/decisions", &request).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => print_decision(&args.workload, &state, &response.decision, None),
    }
    save_learning_state(&args, response.learning_state.as_bytes(), format)
}

/// Run a decision with an in-process agent
pub fn decide_local(args: DecideArgs, format: OutputFormat) -> Result<()> {
    let state = read_state(&args.state)?;
    let learning_state = read_learning_state(args.learning_state.as_deref())?;
    let parameters = read_parameters(args.parameters.as_deref())?;

    let mut agent = match args.seed {
        Some(seed) => QAgent::with_seed(parameters, args.epsilon, seed)?,
        None => QAgent::new(parameters, args.epsilon)?,
    };
    let outcome = agent.decide(&state, &learning_state)?;

    match format {
        OutputFormat::Json => print_json(&LocalDecision {
            decision: &outcome.decision,
            state_name: &outcome.state_name,
            greedy: outcome.greedy,
        })?,
        OutputFormat::Table => print_decision(
            &args.workload,
            &state,
            &outcome.decision,
            Some((&outcome.state_name, outcome.greedy)),
        ),
    }
    save_learning_state(&args, &outcome.learning_state, format)
}

fn print_decision(
    workload: &str,
    state: &State,
    decision: &ScalingDecision,
    local: Option<(&str, bool)>,
) {
    println!("{}", "Scaling Decision".bold());
    println!("{}", "=".repeat(50));
    println!("Workload:               {}", workload.cyan());
    match decision.action {
        Some(action) => println!("Action:                 {}", color_action(action)),
        None => println!("Action:                 {}", "unchanged".dimmed()),
    }
    if let Some((state_name, greedy)) = local {
        let mode = if greedy { "greedy" } else { "explore" };
        println!("Learning state:         {} ({})", state_name, mode);
    }

    let replicas = if decision.replicas == state.replicas {
        decision.replicas.to_string()
    } else {
        decision.replicas.to_string().green().bold().to_string()
    };
    println!("Replicas:               {} -> {}", state.replicas, replicas);
    println!();

    let rows: Vec<ContainerRow> = decision
        .container_resources
        .iter()
        .map(|(name, resources)| ContainerRow {
            container: name.clone(),
            requests: format_resources(&resources.requests),
            limits: format_resources(&resources.limits),
        })
        .collect();
    if !rows.is_empty() {
        println!("{}", Table::new(rows).with(Style::rounded()));
    }
}

fn save_learning_state(args: &DecideArgs, blob: &[u8], format: OutputFormat) -> Result<()> {
    let Some(out) = &args.out else {
        if matches!(format, OutputFormat::Table) {
            print_info("Learning state not saved, pass --out to keep it");
        }
        return Ok(());
    };

    std::fs::write(out, blob)
        .with_context(|| format!("Failed to write learning state {}", out.display()))?;
    if matches!(format, OutputFormat::Table) {
        print_success(&format!("Learning state written to {}", out.display()));
    }
    Ok(())
}
