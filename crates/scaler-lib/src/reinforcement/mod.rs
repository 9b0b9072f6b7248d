//! Reinforcement learning over the scaling actions
//!
//! - [`state`]: quantization of a workload state into a Q-table key
//! - [`q_learning`]: cost model, update rule, greedy selection and the persisted learning state
//! - [`agent`]: the epsilon-greedy agent that turns a state into a scaling decision

pub mod agent;
pub mod q_learning;
pub mod state;

pub use agent::{DecisionOutcome, QAgent};
pub use q_learning::{
    LearningState, LearningStats, QLearning, QTable, QTableRow, QUpdate, RlParameters,
    BOOTSTRAP_VALUE,
};
pub use state::{quantize_percentage, RlState, PERCENTAGE_QUANTUM};
