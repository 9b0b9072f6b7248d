//! Pluggable decision strategies

use crate::error::Result;
use crate::models::{ScalingDecision, State};
use crate::reinforcement::{LearningStats, QAgent};
use rand::Rng;

/// What a strategy hands back for one decision
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome {
    pub decision: ScalingDecision,
    /// Blob to pass back on the next call for the same workload
    pub learning_state: Vec<u8>,
    /// Size of the learned table, for strategies that learn
    pub stats: Option<LearningStats>,
}

/// Turns a workload state into a scaling decision
///
/// The learning state is opaque to callers: whatever comes back must be
/// handed in again on the next call for the same workload.
pub trait ScalingStrategy: Send {
    fn make_decision(
        &mut self,
        state: &State,
        learning_state: &[u8],
    ) -> Result<StrategyOutcome>;

    /// Short name for logs and metrics
    fn name(&self) -> &'static str;
}

/// Keeps the current allocation and leaves the learning state untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpStrategy;

impl ScalingStrategy for NoOpStrategy {
    fn make_decision(
        &mut self,
        state: &State,
        learning_state: &[u8],
    ) -> Result<StrategyOutcome> {
        Ok(StrategyOutcome {
            decision: ScalingDecision::unchanged(state),
            learning_state: learning_state.to_vec(),
            stats: None,
        })
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

impl<R: Rng + Send> ScalingStrategy for QAgent<R> {
    fn make_decision(
        &mut self,
        state: &State,
        learning_state: &[u8],
    ) -> Result<StrategyOutcome> {
        let outcome = self.decide(state, learning_state)?;
        Ok(StrategyOutcome {
            decision: outcome.decision,
            learning_state: outcome.learning_state,
            stats: Some(outcome.stats),
        })
    }

    fn name(&self) -> &'static str {
        "q-learning"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::dec;
    use crate::models::{Constraints, PodMetrics, Resources, ResourcesList};
    use crate::reinforcement::{LearningState, RlParameters};

    fn state() -> State {
        let list = |v| ResourcesList::new(dec(v, 0), dec(v, 0));
        let mut state = State {
            replicas: 3,
            constraints: Constraints {
                min_replicas: 1,
                max_replicas: 5,
                min_resources: list(10),
                max_resources: list(1000),
            },
            pod_metrics: PodMetrics {
                resource_usage: list(60),
                requests: list(100),
                limits: list(200),
                latency_threshold_exceeded: false,
            },
            target_utilization: ResourcesList::new(dec(6, 1), dec(6, 1)),
            ..Default::default()
        };
        state.container_resources.insert(
            "app".to_string(),
            Resources {
                requests: list(100),
                limits: list(200),
            },
        );
        state
    }

    #[test]
    fn test_noop_echoes_learning_state() {
        let mut strategy = NoOpStrategy;
        let outcome = strategy.make_decision(&state(), b"opaque").unwrap();
        assert_eq!(outcome.decision.replicas, 3);
        assert_eq!(outcome.decision.container_resources, state().container_resources);
        assert!(outcome.decision.action.is_none());
        assert_eq!(outcome.learning_state, b"opaque");
        assert!(outcome.stats.is_none());
    }

    #[test]
    fn test_strategies_behind_trait_object() {
        let mut strategies: Vec<Box<dyn ScalingStrategy>> = vec![
            Box::new(NoOpStrategy),
            Box::new(QAgent::with_seed(RlParameters::default(), 0.1, 1).unwrap()),
        ];

        for strategy in strategies.iter_mut() {
            let outcome = strategy.make_decision(&state(), b"").unwrap();
            let decision = &outcome.decision;
            assert!(decision.replicas >= 1 && decision.replicas <= 5, "{}", strategy.name());
            if strategy.name() == "q-learning" {
                let learning = LearningState::decode(&outcome.learning_state).unwrap();
                assert_eq!(learning.previous_action, decision.action);
                assert_eq!(outcome.stats, Some(learning.stats()));
            }
        }
    }
}
