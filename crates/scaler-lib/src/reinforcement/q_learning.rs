//! Cost-minimizing tabular Q-learning
//!
//! Lower Q-values are better: every entry estimates the discounted cost of
//! taking an action in a state. Unseen entries start at [`BOOTSTRAP_VALUE`].

use super::state::RlState;
use crate::decimal::{dec, quo_round, round, Quantity, RoundingMode, RATIO_SCALE};
use crate::error::{Result, ScalingError};
use crate::models::Action;
use crate::quantity::serde_quantity;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Initial cost estimate of a state-action pair
pub const BOOTSTRAP_VALUE: i64 = 0;

/// Action to estimated cost within one state
pub type QTableRow = BTreeMap<Action, Quantity>;

/// State name to its row of action costs
pub type QTable = BTreeMap<String, QTableRow>;

fn bootstrap() -> Quantity {
    Quantity::from(BOOTSTRAP_VALUE)
}

/// Cost model and learning parameters, as configured on the scaled resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RlParameters {
    /// Cost of one unit of requested cpu per replica
    #[serde(with = "serde_quantity", default = "default_cpu_cost")]
    pub cpu_cost: Quantity,
    /// Cost of one unit of requested memory per replica
    #[serde(with = "serde_quantity", default = "default_memory_cost")]
    pub memory_cost: Quantity,
    /// Multiplier applied to the cost of missing resources when over target
    #[serde(with = "serde_quantity", default = "default_underprovisioning_penalty")]
    pub underprovisioning_penalty: Quantity,
    /// Learning rate
    #[serde(with = "serde_quantity", default = "default_alpha")]
    pub alpha: Quantity,
    /// Discount factor
    #[serde(with = "serde_quantity", default = "default_gamma")]
    pub gamma: Quantity,
}

fn default_cpu_cost() -> Quantity {
    Quantity::from(1)
}

fn default_memory_cost() -> Quantity {
    dec(1, 9)
}

fn default_underprovisioning_penalty() -> Quantity {
    Quantity::from(2)
}

fn default_alpha() -> Quantity {
    dec(5, 1)
}

fn default_gamma() -> Quantity {
    dec(9, 1)
}

impl Default for RlParameters {
    fn default() -> Self {
        Self {
            cpu_cost: default_cpu_cost(),
            memory_cost: default_memory_cost(),
            underprovisioning_penalty: default_underprovisioning_penalty(),
            alpha: default_alpha(),
            gamma: default_gamma(),
        }
    }
}

impl RlParameters {
    /// Reject negative costs and learning factors outside `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        for (value, what) in [
            (&self.cpu_cost, "cpu cost"),
            (&self.memory_cost, "memory cost"),
            (&self.underprovisioning_penalty, "underprovisioning penalty"),
        ] {
            if value.is_negative() {
                return Err(ScalingError::invalid_input(format!(
                    "{} cannot be negative",
                    what
                )));
            }
        }

        let one = Quantity::from(1);
        for (value, what) in [(&self.alpha, "alpha"), (&self.gamma, "gamma")] {
            if value.is_negative() || value > &one {
                return Err(ScalingError::invalid_input(format!(
                    "{} must be between 0 and 1, got {}",
                    what, value
                )));
            }
        }
        Ok(())
    }
}

/// The agent's entire persisted memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningState {
    #[serde(default)]
    pub table: QTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<RlState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_action: Option<Action>,
}

/// Size of a Q-table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningStats {
    pub states: usize,
    pub entries: usize,
}

impl LearningState {
    /// Decode a persisted blob; an empty blob is a fresh learning state
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes).map_err(|e| {
            ScalingError::Serialization(format!("cannot decode learning state, {}", e))
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            ScalingError::Serialization(format!("cannot encode learning state, {}", e))
        })
    }

    /// Lowest recorded cost in a state, or the bootstrap value if none is recorded
    pub fn best_value(&self, state: &str) -> Quantity {
        self.table
            .get(state)
            .and_then(|row| row.values().min())
            .cloned()
            .unwrap_or_else(bootstrap)
    }

    /// Remember the transition the next update applies to
    pub fn record(&mut self, state: RlState, action: Action) {
        self.previous_state = Some(state);
        self.previous_action = Some(action);
    }

    pub fn stats(&self) -> LearningStats {
        LearningStats {
            states: self.table.len(),
            entries: self.table.values().map(BTreeMap::len).sum(),
        }
    }
}

/// Outcome of one Q-table update
#[derive(Debug, Clone, PartialEq)]
pub struct QUpdate {
    pub state: String,
    pub action: Action,
    pub cost: Quantity,
    pub previous_value: Quantity,
    pub value: Quantity,
}

/// Cost model plus update and selection rules
#[derive(Debug, Clone, Default)]
pub struct QLearning {
    parameters: RlParameters,
}

impl QLearning {
    pub fn new(parameters: RlParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &RlParameters {
        &self.parameters
    }

    /// Cost of running in `state`
    ///
    /// Requested resources are paid per replica. A resource running above its
    /// target utilization adds the cost of the missing requests, weighted by
    /// the underprovisioning penalty.
    pub fn evaluate_cost(&self, state: &RlState) -> Result<Quantity> {
        let p = &self.parameters;

        let cpu = self.resource_cost(
            &state.cpu_requests,
            &state.cpu_utilization,
            &state.cpu_target_utilization,
            &p.cpu_cost,
        )?;
        let memory = self.resource_cost(
            &state.memory_requests,
            &state.memory_utilization,
            &state.memory_target_utilization,
            &p.memory_cost,
        )?;

        Ok((cpu + memory) * Quantity::from(state.replicas))
    }

    fn resource_cost(
        &self,
        requests: &Quantity,
        utilization: &Quantity,
        target_utilization: &Quantity,
        unit_cost: &Quantity,
    ) -> Result<Quantity> {
        if target_utilization.is_zero() {
            return Err(ScalingError::invalid_input(
                "target utilization cannot be zero",
            ));
        }

        let mut cost = unit_cost * requests;
        if utilization > target_utilization {
            let needed = quo_round(
                &(requests * utilization),
                target_utilization,
                RATIO_SCALE,
                RoundingMode::HalfUp,
            )?;
            cost += (needed - requests) * unit_cost * &self.parameters.underprovisioning_penalty;
        }
        Ok(cost)
    }

    /// Apply the update rule for the previous transition, observed to land in `current`
    ///
    /// `Q[s][a] += alpha * (cost(current) + gamma * best(current) - Q[s][a])`.
    /// Returns `None` on the first call, when no transition was recorded yet.
    pub fn update(&self, learning: &mut LearningState, current: &RlState) -> Result<Option<QUpdate>> {
        initialize_row(&mut learning.table, &current.name);

        let (previous, action) = match (&learning.previous_state, learning.previous_action) {
            (Some(previous), Some(action)) => (previous.name.clone(), action),
            _ => return Ok(None),
        };
        initialize_row(&mut learning.table, &previous);

        let cost = self.evaluate_cost(current)?;
        let best = learning.best_value(&current.name);

        let row = learning.table.entry(previous.clone()).or_default();
        let previous_value = row.get(&action).cloned().unwrap_or_else(bootstrap);

        let p = &self.parameters;
        let temporal_difference = &cost + &p.gamma * &best - &previous_value;
        let value = round(
            &(&previous_value + &p.alpha * temporal_difference),
            RATIO_SCALE,
            RoundingMode::HalfUp,
        );
        row.insert(action, value.clone());

        debug!(
            state = %previous,
            action = %action,
            cost = %cost,
            previous_value = %previous_value,
            value = %value,
            "Q-table updated"
        );

        Ok(Some(QUpdate {
            state: previous,
            action,
            cost,
            previous_value,
            value,
        }))
    }

    /// Actions tied for the lowest recorded cost in `state`
    ///
    /// An unvisited state, or one without recorded entries, offers every action.
    pub fn greedy_actions(&self, learning: &LearningState, state: &str) -> Vec<Action> {
        let row = match learning.table.get(state) {
            Some(row) if !row.is_empty() => row,
            _ => return Action::ALL.to_vec(),
        };

        let best = learning.best_value(state);
        Action::ALL
            .into_iter()
            .filter(|action| row.get(action).is_some_and(|value| value <= &best))
            .collect()
    }
}

/// Record the bootstrap value for every action a state has not seen yet
fn initialize_row(table: &mut QTable, state: &str) {
    let row = table.entry(state.to_string()).or_default();
    for action in Action::ALL {
        row.entry(action).or_insert_with(bootstrap);
    }
}
