use super::desired_replicas;
use crate::decimal::{limit_value, to_replicas, Quantity};
use crate::error::Result;
use crate::models::{ScalingDecision, State};

/// Recommend a new replica count, HPA style
///
/// For cpu and memory independently `desired = ceil(replicas * ratio)`; the
/// larger of both is clamped to `[min_replicas, max_replicas]`. Container
/// resources pass through unchanged.
pub fn horizontal(state: &State) -> Result<ScalingDecision> {
    let desired = desired_replicas(state)?;

    let min_replicas = Quantity::from(state.constraints.min_replicas);
    let max_replicas = Quantity::from(state.constraints.max_replicas);
    let limited = limit_value(&desired, &min_replicas, &max_replicas);

    Ok(ScalingDecision {
        replicas: to_replicas(&limited)?,
        container_resources: state.container_resources.clone(),
        action: None,
    })
}
