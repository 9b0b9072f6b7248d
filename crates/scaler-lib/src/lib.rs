//! Decision core of the hybrid autoscaler
//!
//! This crate provides:
//! - Exact decimal arithmetic and Kubernetes quantity parsing
//! - The Horizontal, Vertical, Hybrid and HybridInverse scaling algorithms
//! - Tabular Q-learning over the scaling actions and its persisted learning state
//! - The decision agent and the strategy seam it plugs into
//! - Health checks and observability

pub mod decimal;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod quantity;
pub mod reinforcement;
pub mod scaling;
pub mod strategy;

pub use error::{Result, ScalingError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ScalerMetrics, StructuredLogger};
pub use reinforcement::{DecisionOutcome, LearningState, QAgent, RlParameters, RlState};
pub use scaling::LimitsToRequestsRatios;
pub use strategy::{NoOpStrategy, ScalingStrategy, StrategyOutcome};
