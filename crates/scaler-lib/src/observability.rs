//! Observability infrastructure for the hybrid scaler
//!
//! Provides:
//! - Prometheus metrics (decision latency, chosen actions, exploration, Q-table size)
//! - Structured JSON logging with tracing

use crate::models::Action;
use crate::reinforcement::LearningStats;
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for decision latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ScalerMetricsInner> = OnceLock::new();

struct ScalerMetricsInner {
    decision_latency_seconds: Histogram,
    decisions: IntCounterVec,
    action_selections: IntCounterVec,
    decision_errors: IntCounterVec,
    q_table_states: IntGauge,
    workloads_tracked: IntGauge,
}

impl ScalerMetricsInner {
    fn new() -> Self {
        Self {
            decision_latency_seconds: register_histogram!(
                "hybrid_scaler_decision_latency_seconds",
                "Time spent computing one scaling decision",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register decision_latency_seconds"),

            decisions: register_int_counter_vec!(
                "hybrid_scaler_decisions_total",
                "Scaling decisions made, by chosen action",
                &["action"]
            )
            .expect("Failed to register decisions_total"),

            action_selections: register_int_counter_vec!(
                "hybrid_scaler_action_selections_total",
                "Action selections, greedy or exploring",
                &["mode"]
            )
            .expect("Failed to register action_selections_total"),

            decision_errors: register_int_counter_vec!(
                "hybrid_scaler_decision_errors_total",
                "Failed decisions, by error kind",
                &["kind"]
            )
            .expect("Failed to register decision_errors_total"),

            q_table_states: register_int_gauge!(
                "hybrid_scaler_q_table_states",
                "Number of states in the Q-table of the last decided workload"
            )
            .expect("Failed to register q_table_states"),

            workloads_tracked: register_int_gauge!(
                "hybrid_scaler_workloads_tracked",
                "Number of workloads with a live decision agent"
            )
            .expect("Failed to register workloads_tracked"),
        }
    }
}

/// Scaler metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Debug, Clone)]
pub struct ScalerMetrics {
    _private: (),
}

impl Default for ScalerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ScalerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ScalerMetricsInner {
        GLOBAL_METRICS.get_or_init(ScalerMetricsInner::new)
    }

    pub fn observe_decision_latency(&self, duration_secs: f64) {
        self.inner().decision_latency_seconds.observe(duration_secs);
    }

    pub fn inc_decisions(&self, action: Action) {
        self.inner()
            .decisions
            .with_label_values(&[action.as_str()])
            .inc();
    }

    /// Count one action selection
    pub fn record_selection(&self, greedy: bool) {
        let mode = if greedy { "greedy" } else { "explore" };
        self.inner()
            .action_selections
            .with_label_values(&[mode])
            .inc();
    }

    pub fn inc_decision_errors(&self, kind: &str) {
        self.inner()
            .decision_errors
            .with_label_values(&[kind])
            .inc();
    }

    pub fn set_q_table_states(&self, states: i64) {
        self.inner().q_table_states.set(states);
    }

    pub fn set_workloads_tracked(&self, count: i64) {
        self.inner().workloads_tracked.set(count);
    }
}

/// Structured logger for scaler events
///
/// Every event carries a stable `event` field so log pipelines can filter
/// on it.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_decision(
        &self,
        workload: &str,
        action: Option<Action>,
        replicas_before: i32,
        replicas_after: i32,
    ) {
        let action = action.map(|a| a.as_str()).unwrap_or("NONE");
        info!(
            event = "decision_made",
            instance = %self.instance,
            workload = %workload,
            action = %action,
            replicas_before = replicas_before,
            replicas_after = replicas_after,
            "Scaling decision made"
        );
    }

    pub fn log_learning_update(&self, workload: &str, stats: LearningStats, blob_bytes: usize) {
        info!(
            event = "learning_updated",
            instance = %self.instance,
            workload = %workload,
            q_table_states = stats.states,
            q_table_entries = stats.entries,
            blob_bytes = blob_bytes,
            "Learning state updated"
        );
    }

    pub fn log_decision_failed(&self, workload: &str, kind: &str, error: &str) {
        warn!(
            event = "decision_failed",
            instance = %self.instance,
            workload = %workload,
            kind = %kind,
            error = %error,
            "Scaling decision failed, no decision returned"
        );
    }

    pub fn log_startup(&self, version: &str, port: u16) {
        info!(
            event = "service_started",
            instance = %self.instance,
            version = %version,
            port = port,
            "Hybrid scaler started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Hybrid scaler shutting down"
        );
    }
}
