use super::{desired_replicas, vertical, LimitsToRequestsRatios};
use crate::decimal::{limit_value, quo_round, to_replicas, Quantity, RoundingMode, RATIO_SCALE};
use crate::error::{Result, ScalingError};
use crate::models::{ScalingDecision, State};
use num_traits::Zero;

/// Direction of the tempered horizontal step
#[derive(Debug, Clone, Copy)]
enum Step {
    /// Half the distance towards the horizontal recommendation, rounded away from zero
    Towards,
    /// Half the distance rounded towards zero, in the opposite direction
    Away,
}

/// Recommend horizontal and vertical scaling together
///
/// Replicas move half the way towards the horizontal recommendation and
/// vertical scaling absorbs the remainder.
pub fn hybrid(state: &State, ratios: &LimitsToRequestsRatios) -> Result<ScalingDecision> {
    tempered(state, ratios, Step::Towards)
}

/// Like [`hybrid`], but the replica step goes against the horizontal recommendation
///
/// The half step is rounded down and negated, so this is not the mirror image
/// of [`hybrid`] for odd distances.
pub fn hybrid_inverse(state: &State, ratios: &LimitsToRequestsRatios) -> Result<ScalingDecision> {
    tempered(state, ratios, Step::Away)
}

fn tempered(state: &State, ratios: &LimitsToRequestsRatios, step: Step) -> Result<ScalingDecision> {
    let recommendation = desired_replicas(state)?;

    let current = Quantity::from(state.replicas);
    let difference = &recommendation - &current;
    let two = Quantity::from(2);
    let delta = match step {
        Step::Towards => quo_round(&difference, &two, 0, RoundingMode::Up)?,
        Step::Away => -quo_round(&difference, &two, 0, RoundingMode::Down)?,
    };

    let min_replicas = Quantity::from(state.constraints.min_replicas);
    let max_replicas = Quantity::from(state.constraints.max_replicas);
    let limited = limit_value(&(&current + &delta), &min_replicas, &max_replicas);

    if limited <= Quantity::zero() {
        return Err(ScalingError::BoundaryExhaustion(
            "attempting to scale to zero replicas, please provide min and max values for replicas to prevent this"
                .to_string(),
        ));
    }

    // usage redistributes across however many pods will exist
    let replicas_ratio = quo_round(&current, &limited, RATIO_SCALE, RoundingMode::HalfUp)?;
    let mut hypothetical = state.clone();
    hypothetical.replicas = to_replicas(&limited)?;
    let usage = &mut hypothetical.pod_metrics.resource_usage;
    usage.cpu = &usage.cpu * &replicas_ratio;
    usage.memory = &usage.memory * &replicas_ratio;

    vertical(&hypothetical, ratios)
}
