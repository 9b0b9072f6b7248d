//! Deterministic resource allocation algorithms
//!
//! Each algorithm is a pure function from a [`State`] snapshot to a new
//! [`ScalingDecision`]:
//! - Horizontal: replica count from the current-to-target utilization ratio
//! - Vertical: per-container requests and limits, preserving each container's share
//! - Hybrid / HybridInverse: a tempered horizontal step, with vertical scaling
//!   absorbing the remainder

mod horizontal;
mod hybrid;
mod vertical;

pub use horizontal::horizontal;
pub use hybrid::{hybrid, hybrid_inverse};
pub use vertical::vertical;

use crate::decimal::{quo_round, round, Quantity, RoundingMode, RATIO_SCALE};
use crate::error::{Result, ScalingError};
use crate::models::{PodMetrics, ScalingDecision, State};
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// Per-resource limits-to-requests ratio kept constant by vertical scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsToRequestsRatios {
    pub cpu: Quantity,
    pub memory: Quantity,
}

impl LimitsToRequestsRatios {
    /// Derive the ratios from a pod's current requests and limits
    pub fn from_pod_metrics(metrics: &PodMetrics) -> Result<Self> {
        if metrics.requests.cpu.is_zero() {
            return Err(ScalingError::invalid_input("cpu requests cannot be zero"));
        }
        if metrics.requests.memory.is_zero() {
            return Err(ScalingError::invalid_input("memory requests cannot be zero"));
        }

        Ok(Self {
            cpu: quo_round(
                &metrics.limits.cpu,
                &metrics.requests.cpu,
                RATIO_SCALE,
                RoundingMode::HalfUp,
            )?,
            memory: quo_round(
                &metrics.limits.memory,
                &metrics.requests.memory,
                RATIO_SCALE,
                RoundingMode::HalfUp,
            )?,
        })
    }
}

/// Signature shared by the algorithms that need the cached ratios
pub type ScalingFn = fn(&State, &LimitsToRequestsRatios) -> Result<ScalingDecision>;

/// `(usage / requests) / target_utilization`
pub(crate) fn current_to_target_utilization_ratio(
    usage: &Quantity,
    requests: &Quantity,
    target_utilization: &Quantity,
) -> Result<Quantity> {
    if requests.is_zero() {
        return Err(ScalingError::invalid_input("requests cannot be zero"));
    }
    if target_utilization.is_zero() {
        return Err(ScalingError::invalid_input(
            "target utilization cannot be zero",
        ));
    }

    let utilization = quo_round(usage, requests, RATIO_SCALE, RoundingMode::HalfUp)?;
    quo_round(
        &utilization,
        target_utilization,
        RATIO_SCALE,
        RoundingMode::HalfUp,
    )
}

/// Unclamped HPA-style recommendation: `max(ceil(replicas * ratio_k))` over cpu and memory
pub(crate) fn desired_replicas(state: &State) -> Result<Quantity> {
    if state.replicas == 0 {
        return Err(ScalingError::invalid_input(
            "cannot calculate new number of replicas, current replicas is zero",
        ));
    }
    let current = Quantity::from(state.replicas);
    let metrics = &state.pod_metrics;

    let cpu_ratio = current_to_target_utilization_ratio(
        &metrics.resource_usage.cpu,
        &metrics.requests.cpu,
        &state.target_utilization.cpu,
    )
    .map_err(|e| with_context(e, "cpu current to target utilization ratio"))?;
    let desired_cpu = round(&(&current * &cpu_ratio), 0, RoundingMode::Ceiling);

    let memory_ratio = current_to_target_utilization_ratio(
        &metrics.resource_usage.memory,
        &metrics.requests.memory,
        &state.target_utilization.memory,
    )
    .map_err(|e| with_context(e, "memory current to target utilization ratio"))?;
    let desired_memory = round(&(&current * &memory_ratio), 0, RoundingMode::Ceiling);

    Ok(desired_cpu.max(desired_memory))
}

fn with_context(err: ScalingError, what: &str) -> ScalingError {
    match err {
        ScalingError::InvalidInput(message) => {
            ScalingError::InvalidInput(format!("unable to calculate {}, {}", what, message))
        }
        other => other,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::decimal::{dec, Quantity};
    use crate::models::{Constraints, PodMetrics, Resources, ResourcesList, State};

    pub fn list(cpu: Quantity, memory: Quantity) -> ResourcesList {
        ResourcesList::new(cpu, memory)
    }

    pub fn same(value: Quantity) -> ResourcesList {
        ResourcesList::new(value.clone(), value)
    }

    /// Single-container state whose pod totals equal the container's resources
    pub fn single_container_state(
        replicas: i32,
        requests: ResourcesList,
        limits: ResourcesList,
        usage: ResourcesList,
        target: ResourcesList,
    ) -> State {
        let mut state = State {
            replicas,
            constraints: Constraints {
                min_replicas: 1,
                max_replicas: 10,
                min_resources: same(dec(50, 0)),
                max_resources: same(dec(500, 0)),
            },
            pod_metrics: PodMetrics {
                resource_usage: usage,
                requests: requests.clone(),
                limits: limits.clone(),
                latency_threshold_exceeded: false,
            },
            target_utilization: target,
            ..Default::default()
        };
        state
            .container_resources
            .insert("container".to_string(), Resources { requests, limits });
        state
    }
}
