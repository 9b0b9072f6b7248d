//! Workload agents tracked by the service

use anyhow::Result;
use colored::Colorize;

use crate::client::{ApiClient, WorkloadList};
use crate::output::{print_json, print_success, print_warning, OutputFormat};

pub async fn list_workloads(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: WorkloadList = client.get("api/v1/workloads").await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.workloads.is_empty() {
                print_warning("No workloads tracked");
                return Ok(());
            }
            println!("{}", "Tracked Workloads".bold());
            println!("{}", "-".repeat(50));
            for workload in &result.workloads {
                println!("{}", workload.cyan());
            }
        }
    }

    Ok(())
}

/// Drop a workload's agent so its ratios are captured again on the next decision
pub async fn forget_workload(client: &ApiClient, workload: &str) -> Result<()> {
    let Some((namespace, name)) = workload.split_once('/') else {
        anyhow::bail!("Workload must be <namespace>/<name>, got {:?}", workload);
    };

    client
        .delete(&format!("api/v1/workloads/{}/{}", namespace, name))
        .await?;
    print_success(&format!("Forgot workload {}", workload));
    Ok(())
}
