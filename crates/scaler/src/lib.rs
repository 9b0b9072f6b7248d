//! Hybrid scaler decision service
//!
//! Hosts one decision agent per scaled workload behind an HTTP API, next to
//! health probes and Prometheus metrics.

pub mod api;
pub mod config;
pub mod registry;
