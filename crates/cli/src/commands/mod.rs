//! CLI subcommands

pub mod decide;
pub mod inspect;
pub mod quantize;
pub mod workloads;

use anyhow::{Context, Result};
use scaler_lib::{RlParameters, State};
use std::path::Path;

/// Read a workload state from a JSON file
pub fn read_state(path: &Path) -> Result<State> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse state file {}", path.display()))
}

/// Read learning parameters from a JSON file, or the defaults
pub fn read_parameters(path: Option<&Path>) -> Result<RlParameters> {
    let Some(path) = path else {
        return Ok(RlParameters::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameters file {}", path.display()))?;
    let parameters: RlParameters = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse parameters file {}", path.display()))?;
    parameters.validate()?;
    Ok(parameters)
}

/// Read a learning state blob; a missing file reads as empty
pub fn read_learning_state(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) if path.exists() => std::fs::read(path)
            .with_context(|| format!("Failed to read learning state {}", path.display())),
        _ => Ok(Vec::new()),
    }
}
