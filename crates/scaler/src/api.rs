//! HTTP API: scaling decisions, workload management, health checks and metrics

use crate::registry::WorkloadRegistry;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use scaler_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    observability::{ScalerMetrics, StructuredLogger},
    Action, RlParameters, ScalingDecision, ScalingError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: ScalerMetrics,
    pub logger: StructuredLogger,
    pub workloads: WorkloadRegistry,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: ScalerMetrics,
        logger: StructuredLogger,
        workloads: WorkloadRegistry,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            logger,
            workloads,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    /// `namespace/name` of the scaled workload
    pub workload: String,
    pub state: scaler_lib::State,
    /// Blob returned by the previous decision; absent on the first one
    #[serde(default)]
    pub learning_state: Option<String>,
    /// Overrides the service's default learning parameters
    #[serde(default)]
    pub parameters: Option<RlParameters>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub decision: ScalingDecision,
    pub learning_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadsResponse {
    pub workloads: Vec<String>,
}

/// Error body: `{"error": "<kind>", "message": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: message.into(),
        }
    }
}

impl From<ScalingError> for ApiError {
    fn from(err: ScalingError) -> Self {
        let status = match err {
            ScalingError::Serialization(_) => StatusCode::BAD_REQUEST,
            ScalingError::InvalidInput(_) | ScalingError::BoundaryExhaustion(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };
        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.kind,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

fn validate_workload_key(workload: &str) -> Result<(), ScalingError> {
    match workload.split_once('/') {
        Some((namespace, name))
            if !namespace.is_empty() && !name.is_empty() && !name.contains('/') =>
        {
            Ok(())
        }
        _ => Err(ScalingError::invalid_input(format!(
            "workload must be <namespace>/<name>, got {:?}",
            workload
        ))),
    }
}

/// Run one decision for a workload
async fn decide(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let started = Instant::now();
    let workload = request.workload.clone();

    let result = run_decision(&state, request).await;
    state.metrics.observe_decision_latency(started.elapsed().as_secs_f64());
    state
        .health_registry
        .record_outcome(components::DECISION_ENGINE, &result)
        .await;

    match result {
        Ok(response) => {
            if let Some(action) = response.action {
                state.metrics.inc_decisions(action);
            }
            Ok(Json(response))
        }
        Err(err) => {
            state.metrics.inc_decision_errors(err.kind());
            state
                .logger
                .log_decision_failed(&workload, err.kind(), &err.to_string());
            Err(err.into())
        }
    }
}

async fn run_decision(
    state: &AppState,
    request: DecisionRequest,
) -> Result<DecisionResponse, ScalingError> {
    validate_workload_key(&request.workload)?;

    // agent construction fails on invalid learning parameters
    let agent = state
        .workloads
        .agent(&request.workload, request.parameters)
        .await;
    state
        .health_registry
        .record_outcome(components::WORKLOAD_REGISTRY, &agent)
        .await;
    let agent = agent?;
    let previous = request.learning_state.unwrap_or_default();

    let outcome = {
        let mut agent = agent.lock().await;
        agent.make_decision(&request.state, previous.as_bytes())?
    };
    let decision = outcome.decision;

    let learning_state = String::from_utf8(outcome.learning_state).map_err(|e| {
        ScalingError::Serialization(format!("learning state is not valid UTF-8, {}", e))
    })?;

    state.logger.log_decision(
        &request.workload,
        decision.action,
        request.state.replicas,
        decision.replicas,
    );
    if let Some(stats) = outcome.stats {
        state
            .logger
            .log_learning_update(&request.workload, stats, learning_state.len());
    }

    Ok(DecisionResponse {
        action: decision.action,
        decision,
        learning_state,
    })
}

async fn list_workloads(State(state): State<Arc<AppState>>) -> Json<WorkloadsResponse> {
    Json(WorkloadsResponse {
        workloads: state.workloads.workloads(),
    })
}

/// Forget a workload's agent, so its limits-to-requests ratios are captured again
async fn forget_workload(
    State(state): State<Arc<AppState>>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let workload = format!("{}/{}", namespace, name);
    if state.workloads.remove(&workload) {
        info!(workload = %workload, "Workload agent removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("unknown workload {}", workload)))
    }
}

/// Health check response - 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/decisions", post(decide))
        .route("/api/v1/workloads", get(list_workloads))
        .route("/api/v1/workloads/:namespace/:name", delete(forget_workload))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_key_validation() {
        assert!(validate_workload_key("default/web").is_ok());
        assert!(validate_workload_key("web").is_err());
        assert!(validate_workload_key("/web").is_err());
        assert!(validate_workload_key("default/").is_err());
        assert!(validate_workload_key("a/b/c").is_err());
    }

    #[test]
    fn test_error_status_mapping() {
        let invalid: ApiError = ScalingError::invalid_input("zero").into();
        assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(invalid.kind, "invalid_input");

        let decode: ApiError = ScalingError::Serialization("bad".into()).into();
        assert_eq!(decode.status, StatusCode::BAD_REQUEST);

        let boundary: ApiError = ScalingError::BoundaryExhaustion("zero replicas".into()).into();
        assert_eq!(boundary.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(boundary.kind, "boundary_exhaustion");
    }
}
