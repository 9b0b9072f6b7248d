//! Quantized projection of a workload state used as the Q-table key

use crate::decimal::{quo_round, truncate_to_i64, Quantity, RoundingMode, RATIO_SCALE};
use crate::error::{Result, ScalingError};
use crate::models::State;
use crate::quantity::serde_quantity;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// Width of the percentage buckets: 0, 25, 50, 75 and 100
pub const PERCENTAGE_QUANTUM: i64 = 25;

/// Upper bound of every quantized percentage
const MAX_PERCENTAGE: i64 = 100;

/// Reduced, lossy view of a [`State`]
///
/// Two states with the same `name` share one Q-table row. The remaining
/// fields feed the cost model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RlState {
    /// `{replicas}_{cpuLimits}_{memoryLimits}_{cpuUtilization}_{memoryUtilization}`
    pub name: String,
    pub replicas: i32,
    #[serde(with = "serde_quantity")]
    pub cpu_requests: Quantity,
    #[serde(with = "serde_quantity")]
    pub memory_requests: Quantity,
    /// Usage divided by requests
    #[serde(with = "serde_quantity")]
    pub cpu_utilization: Quantity,
    #[serde(with = "serde_quantity")]
    pub memory_utilization: Quantity,
    #[serde(with = "serde_quantity")]
    pub cpu_target_utilization: Quantity,
    #[serde(with = "serde_quantity")]
    pub memory_target_utilization: Quantity,
}

impl RlState {
    /// Quantize a workload state
    ///
    /// Fails if pod requests, the max resource bounds or the target
    /// utilizations are zero.
    pub fn from_state(state: &State) -> Result<Self> {
        let metrics = &state.pod_metrics;
        let max = &state.constraints.max_resources;
        let target = &state.target_utilization;

        for (value, what) in [
            (&metrics.requests.cpu, "cpu requests"),
            (&metrics.requests.memory, "memory requests"),
            (&max.cpu, "max cpu"),
            (&max.memory, "max memory"),
            (&target.cpu, "cpu target utilization"),
            (&target.memory, "memory target utilization"),
        ] {
            if value.is_zero() {
                return Err(ScalingError::invalid_input(format!("{} cannot be zero", what)));
            }
        }

        let half_up = |x: &Quantity, y: &Quantity| quo_round(x, y, RATIO_SCALE, RoundingMode::HalfUp);

        let cpu_utilization = half_up(&metrics.resource_usage.cpu, &metrics.requests.cpu)?;
        let memory_utilization = half_up(&metrics.resource_usage.memory, &metrics.requests.memory)?;
        let cpu_utilization_ratio = half_up(&cpu_utilization, &target.cpu)?;
        let memory_utilization_ratio = half_up(&memory_utilization, &target.memory)?;
        let cpu_limits_of_max = half_up(&metrics.limits.cpu, &max.cpu)?;
        let memory_limits_of_max = half_up(&metrics.limits.memory, &max.memory)?;

        let quantum = Quantity::from(PERCENTAGE_QUANTUM);
        let bucket = |ratio: &Quantity| quantize_percentage(&(ratio * Quantity::from(100)), &quantum);

        let name = format!(
            "{}_{}_{}_{}_{}",
            state.replicas,
            bucket(&cpu_limits_of_max)?,
            bucket(&memory_limits_of_max)?,
            bucket(&cpu_utilization_ratio)?,
            bucket(&memory_utilization_ratio)?,
        );

        Ok(Self {
            name,
            replicas: state.replicas,
            cpu_requests: metrics.requests.cpu.clone(),
            memory_requests: metrics.requests.memory.clone(),
            cpu_utilization,
            memory_utilization,
            cpu_target_utilization: target.cpu.clone(),
            memory_target_utilization: target.memory.clone(),
        })
    }
}

/// Snap a percentage down to a multiple of `quantum`, capped at 100
pub fn quantize_percentage(value: &Quantity, quantum: &Quantity) -> Result<i64> {
    let buckets = quo_round(value, quantum, 0, RoundingMode::Down)?;
    let quantized = truncate_to_i64(&(buckets * quantum))?;
    Ok(quantized.min(MAX_PERCENTAGE))
}
