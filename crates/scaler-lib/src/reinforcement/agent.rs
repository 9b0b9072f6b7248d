//! Q-learning decision agent
//!
//! One agent serves one scaled workload. The learning state travels in and
//! out of every call; the only thing the agent itself remembers is the
//! limits-to-requests ratios captured on its first decision.

use super::q_learning::{LearningState, LearningStats, QLearning, RlParameters};
use super::state::RlState;
use crate::error::{Result, ScalingError};
use crate::models::{Action, ScalingDecision, State};
use crate::observability::ScalerMetrics;
use crate::scaling::{self, LimitsToRequestsRatios};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Everything one decision produced
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub decision: ScalingDecision,
    pub learning_state: Vec<u8>,
    pub action: Action,
    /// False when the action was picked by exploration
    pub greedy: bool,
    pub state_name: String,
    pub stats: LearningStats,
}

/// Epsilon-greedy Q-learning agent
#[derive(Debug)]
pub struct QAgent<R: Rng = StdRng> {
    learning: QLearning,
    epsilon: f64,
    rng: R,
    ratios: Option<LimitsToRequestsRatios>,
    metrics: Option<ScalerMetrics>,
}

impl QAgent<StdRng> {
    /// Agent seeded from the operating system
    pub fn new(parameters: RlParameters, epsilon: f64) -> Result<Self> {
        Self::with_rng(parameters, epsilon, StdRng::from_entropy())
    }

    /// Agent with reproducible exploration
    pub fn with_seed(parameters: RlParameters, epsilon: f64, seed: u64) -> Result<Self> {
        Self::with_rng(parameters, epsilon, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> QAgent<R> {
    pub fn with_rng(parameters: RlParameters, epsilon: f64, rng: R) -> Result<Self> {
        parameters.validate()?;
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(ScalingError::invalid_input(format!(
                "epsilon must be between 0 and 1, got {}",
                epsilon
            )));
        }

        Ok(Self {
            learning: QLearning::new(parameters),
            epsilon,
            rng,
            ratios: None,
            metrics: None,
        })
    }

    /// Report exploration and Q-table size to Prometheus
    pub fn with_metrics(mut self, metrics: ScalerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn parameters(&self) -> &RlParameters {
        self.learning.parameters()
    }

    /// Ratios captured on the first decision, if any
    ///
    /// They are never refreshed: if the live ratio drifts later, this agent
    /// keeps scaling with the stale one until it is replaced.
    pub fn cached_ratios(&self) -> Option<&LimitsToRequestsRatios> {
        self.ratios.as_ref()
    }

    /// Run one decision and return the updated learning state
    pub fn decide(&mut self, state: &State, learning_state: &[u8]) -> Result<DecisionOutcome> {
        // cached only once a decision has been produced from them
        let ratios = match &self.ratios {
            Some(ratios) => ratios.clone(),
            None => LimitsToRequestsRatios::from_pod_metrics(&state.pod_metrics)?,
        };

        let rl_state = RlState::from_state(state)?;
        let mut learning = LearningState::decode(learning_state)?;
        self.learning.update(&mut learning, &rl_state)?;

        let greedy = self.is_greedy();
        let candidates = if greedy {
            self.learning.greedy_actions(&learning, &rl_state.name)
        } else {
            Action::ALL.to_vec()
        };
        let action = candidates
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| ScalingError::invalid_input("no action to choose from"))?;

        let decision = dispatch(action, state, &ratios)?.with_action(action);

        let state_name = rl_state.name.clone();
        learning.record(rl_state, action);
        let encoded = learning.encode()?;
        if self.ratios.is_none() {
            self.ratios = Some(ratios);
        }

        let stats = learning.stats();
        if let Some(metrics) = &self.metrics {
            metrics.record_selection(greedy);
            metrics.set_q_table_states(stats.states as i64);
        }

        info!(
            action = %action,
            greedy = greedy,
            state = %state_name,
            replicas_before = state.replicas,
            replicas_after = decision.replicas,
            q_table_states = stats.states,
            "Scaling decision made"
        );

        Ok(DecisionOutcome {
            decision,
            learning_state: encoded,
            action,
            greedy,
            state_name,
            stats,
        })
    }

    fn is_greedy(&mut self) -> bool {
        let roll: u32 = self.rng.gen_range(0..100);
        f64::from(roll) >= self.epsilon * 100.0
    }
}

/// Run the scaling algorithm behind `action`
fn dispatch(action: Action, state: &State, ratios: &LimitsToRequestsRatios) -> Result<ScalingDecision> {
    match action {
        Action::None => Ok(ScalingDecision::unchanged(state)),
        Action::Horizontal => scaling::horizontal(state),
        Action::Vertical => scaling::vertical(state, ratios),
        Action::Hybrid => scaling::hybrid(state, ratios),
        Action::HybridInverse => scaling::hybrid_inverse(state, ratios),
    }
}
