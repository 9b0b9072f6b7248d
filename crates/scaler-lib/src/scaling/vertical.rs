use super::{current_to_target_utilization_ratio, LimitsToRequestsRatios};
use crate::decimal::{limit_value, quo_round, Quantity, RoundingMode, RATIO_SCALE};
use crate::error::{Result, ScalingError};
use crate::models::{ContainerResources, Resources, ResourcesList, ScalingDecision, State};
use num_traits::Zero;

/// Desired pod-level allocation for one resource
#[derive(Debug)]
struct PodTarget<'a> {
    current_requests: &'a Quantity,
    current_limits: &'a Quantity,
    requests: Quantity,
    limits: Quantity,
    rounding: RoundingMode,
}

impl PodTarget<'_> {
    /// Scale one container's requests and limits by `desired_pod / current_pod`
    fn scale(&self, requests: &Quantity, limits: &Quantity) -> Result<(Quantity, Quantity)> {
        let requests_factor = quo_round(
            &self.requests,
            self.current_requests,
            RATIO_SCALE,
            self.rounding,
        )?;
        let limits_factor = quo_round(&self.limits, self.current_limits, RATIO_SCALE, self.rounding)?;

        Ok((
            (requests * &requests_factor).normalized(),
            (limits * &limits_factor).normalized(),
        ))
    }
}

#[allow(clippy::too_many_arguments)]
fn pod_target<'a>(
    resource: &str,
    usage: &Quantity,
    current_requests: &'a Quantity,
    current_limits: &'a Quantity,
    target_utilization: &Quantity,
    min: &Quantity,
    max: &Quantity,
    limits_to_requests: &Quantity,
) -> Result<PodTarget<'a>> {
    if current_requests.is_zero() {
        return Err(ScalingError::invalid_input(format!(
            "unable to calculate new pod resources, {} requests are zero",
            resource
        )));
    }
    if current_limits.is_zero() {
        return Err(ScalingError::invalid_input(format!(
            "unable to calculate new pod resources, {} limits are zero",
            resource
        )));
    }

    let ratio = current_to_target_utilization_ratio(usage, current_requests, target_utilization)
        .map_err(|e| {
            ScalingError::invalid_input(format!(
                "unable to calculate {} current to target utilization ratio, {}",
                resource, e
            ))
        })?;

    let requests = limit_value(&(current_requests * &ratio), min, max);
    // limits may land back in range after the requests clamp, so clamp again
    let limits = limit_value(&(&requests * limits_to_requests), min, max);

    let mut rounding = RoundingMode::HalfUp;
    if &requests == min {
        rounding = RoundingMode::Ceiling;
    }
    if &limits == max {
        rounding = RoundingMode::Down;
    }

    Ok(PodTarget {
        current_requests,
        current_limits,
        requests,
        limits,
        rounding,
    })
}

/// Recommend new requests and limits for every container
///
/// Each container keeps its share of the pod totals and each resource keeps
/// its limits-to-requests ratio. Pod totals are clamped to the per-pod
/// resource bounds. The replica count is left as is.
pub fn vertical(state: &State, ratios: &LimitsToRequestsRatios) -> Result<ScalingDecision> {
    if state.replicas == 0 {
        return Err(ScalingError::invalid_input(
            "unable to calculate new pod resources, current number of replicas is zero",
        ));
    }

    let metrics = &state.pod_metrics;
    let constraints = &state.constraints;

    let cpu = pod_target(
        "cpu",
        &metrics.resource_usage.cpu,
        &metrics.requests.cpu,
        &metrics.limits.cpu,
        &state.target_utilization.cpu,
        &constraints.min_resources.cpu,
        &constraints.max_resources.cpu,
        &ratios.cpu,
    )?;
    let memory = pod_target(
        "memory",
        &metrics.resource_usage.memory,
        &metrics.requests.memory,
        &metrics.limits.memory,
        &state.target_utilization.memory,
        &constraints.min_resources.memory,
        &constraints.max_resources.memory,
        &ratios.memory,
    )?;

    let mut container_resources = ContainerResources::new();
    for (name, resources) in &state.container_resources {
        let (cpu_requests, cpu_limits) =
            cpu.scale(&resources.requests.cpu, &resources.limits.cpu)?;
        let (memory_requests, memory_limits) =
            memory.scale(&resources.requests.memory, &resources.limits.memory)?;

        container_resources.insert(
            name.clone(),
            Resources {
                requests: ResourcesList::new(cpu_requests, memory_requests),
                limits: ResourcesList::new(cpu_limits, memory_limits),
            },
        );
    }

    Ok(ScalingDecision {
        replicas: state.replicas,
        container_resources,
        action: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::dec;
    use crate::scaling::test_support::*;
    use proptest::prelude::*;

    fn ratios(value: Quantity) -> LimitsToRequestsRatios {
        LimitsToRequestsRatios {
            cpu: value.clone(),
            memory: value,
        }
    }

    #[test]
    fn test_scales_requests_and_preserves_limits_ratio() {
        // 100m requests, 200m limits, utilization 75% at target 50%
        let mut state = single_container_state(
            1,
            same(dec(100, 3)),
            same(dec(200, 3)),
            same(dec(75, 3)),
            same(dec(5, 1)),
        );
        state.constraints.min_resources = same(dec(50, 3));
        state.constraints.max_resources = same(dec(1, 0));

        let decision = vertical(&state, &ratios(dec(2, 0))).unwrap();
        let container = &decision.container_resources["container"];
        assert_eq!(decision.replicas, 1);
        assert_eq!(container.requests.cpu, dec(150, 3));
        assert_eq!(container.limits.cpu, dec(300, 3));
        assert_eq!(container.requests.memory, dec(150, 3));
        assert_eq!(container.limits.memory, dec(300, 3));
    }

    #[test]
    fn test_no_scaling_required() {
        let state = single_container_state(
            2,
            same(dec(100, 0)),
            same(dec(200, 0)),
            same(dec(50, 0)),
            same(dec(5, 1)),
        );
        let decision = vertical(&state, &ratios(dec(2, 0))).unwrap();
        let container = &decision.container_resources["container"];
        assert_eq!(container.requests, same(dec(100, 0)));
        assert_eq!(container.limits, same(dec(200, 0)));
    }

    #[test]
    fn test_limits_clamped_to_max_round_down() {
        // requests go to 300, limits would be 600 but max is 500
        let state = single_container_state(
            1,
            same(dec(100, 0)),
            same(dec(200, 0)),
            same(dec(150, 0)),
            same(dec(5, 1)),
        );
        let decision = vertical(&state, &ratios(dec(2, 0))).unwrap();
        let container = &decision.container_resources["container"];
        assert_eq!(container.requests, same(dec(300, 0)));
        assert_eq!(container.limits, same(dec(500, 0)));
    }

    #[test]
    fn test_requests_clamped_to_min_round_ceiling() {
        // two containers sharing a pod: requests would drop to 30, min is 50
        let mut state = single_container_state(
            1,
            same(dec(300, 0)),
            same(dec(600, 0)),
            same(dec(15, 0)),
            same(dec(5, 1)),
        );
        state.container_resources.clear();
        state.container_resources.insert(
            "app".to_string(),
            Resources {
                requests: same(dec(100, 0)),
                limits: same(dec(200, 0)),
            },
        );
        state.container_resources.insert(
            "sidecar".to_string(),
            Resources {
                requests: same(dec(200, 0)),
                limits: same(dec(400, 0)),
            },
        );

        let decision = vertical(&state, &ratios(dec(2, 0))).unwrap();
        let app = &decision.container_resources["app"];
        let sidecar = &decision.container_resources["sidecar"];

        // 50/300 rounded up to 0.16666667
        assert_eq!(app.requests.cpu, dec(16666667, 6));
        assert_eq!(sidecar.requests.cpu, dec(33333334, 6));
        assert!(&app.requests.cpu + &sidecar.requests.cpu >= dec(50, 0));
        // 100/600 rounded up as well
        assert_eq!(app.limits.cpu, dec(33333334, 6));
        assert_eq!(sidecar.limits.cpu, dec(66666668, 6));
    }

    #[test]
    fn test_resources_scale_independently() {
        let state = single_container_state(
            1,
            same(dec(100, 0)),
            same(dec(200, 0)),
            list(dec(100, 0), dec(25, 0)),
            same(dec(5, 1)),
        );
        let decision = vertical(&state, &ratios(dec(2, 0))).unwrap();
        let container = &decision.container_resources["container"];
        assert_eq!(container.requests.cpu, dec(200, 0));
        assert_eq!(container.limits.cpu, dec(400, 0));
        assert_eq!(container.requests.memory, dec(50, 0));
        assert_eq!(container.limits.memory, dec(100, 0));
    }

    #[test]
    fn test_zero_replicas_fails() {
        let state = single_container_state(
            0,
            same(dec(100, 0)),
            same(dec(200, 0)),
            same(dec(50, 0)),
            same(dec(5, 1)),
        );
        assert!(vertical(&state, &ratios(dec(2, 0))).is_err());
    }

    #[test]
    fn test_zero_requests_fails() {
        let state = single_container_state(
            1,
            list(dec(100, 0), dec(0, 0)),
            same(dec(200, 0)),
            same(dec(50, 0)),
            same(dec(5, 1)),
        );
        let err = vertical(&state, &ratios(dec(2, 0))).unwrap_err();
        assert!(matches!(err, ScalingError::InvalidInput(_)));
        assert!(err.to_string().contains("memory"));
    }

    #[test]
    fn test_zero_target_utilization_fails() {
        let state = single_container_state(
            1,
            same(dec(100, 0)),
            same(dec(200, 0)),
            same(dec(50, 0)),
            list(dec(5, 1), dec(0, 0)),
        );
        assert!(vertical(&state, &ratios(dec(2, 0))).is_err());
    }

    proptest! {
        #[test]
        fn prop_single_container_stays_within_bounds(
            requests in 1i64..2_000,
            ratio in 1i64..4,
            usage in 0i64..4_000,
            target in 10i64..=100,
        ) {
            let mut state = single_container_state(
                3,
                same(dec(requests, 0)),
                same(dec(requests * ratio, 0)),
                same(dec(usage, 0)),
                same(dec(target, 2)),
            );
            state.constraints.min_resources = same(dec(10, 0));
            state.constraints.max_resources = same(dec(1_000, 0));

            let decision = vertical(&state, &ratios(dec(ratio, 0))).unwrap();
            let container = &decision.container_resources["container"];
            for value in [
                &container.requests.cpu,
                &container.requests.memory,
                &container.limits.cpu,
                &container.limits.memory,
            ] {
                prop_assert!(*value >= dec(10, 0), "{} below min", value);
                prop_assert!(*value <= dec(1_000, 0), "{} above max", value);
            }
        }
    }
}
