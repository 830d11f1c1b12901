//! HTTP query surface for the rest of the sidecar
//!
//! Read-only routes over a ready coordinator:
//! - `GET /health`
//! - `GET /v1/identity/instance`: this node's record
//! - `GET /v1/identity/instances`: instances document for the configured scope
//! - `GET /v1/identity/master`: master eligibility

use crate::common::Error;
use crate::coordinator::codec::instances_to_json;
use crate::coordinator::manager::InstanceCoordinator;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct IdentityState {
    pub coordinator: Arc<InstanceCoordinator>,
}

/// Creates the HTTP router with all identity endpoints.
pub fn create_router(state: IdentityState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/identity/instance", get(get_instance))
        .route("/v1/identity/instances", get(get_instances))
        .route("/v1/identity/master", get(get_master))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<IdentityState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "instance_id": state.coordinator.get_instance().instance_id,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn get_instance(State(state): State<IdentityState>) -> impl IntoResponse {
    Json(state.coordinator.get_instance().clone())
}

/// Directory listing runs on the blocking pool; the directory API is synchronous.
async fn get_instances(State(state): State<IdentityState>) -> impl IntoResponse {
    let coordinator = state.coordinator.clone();
    let listed = tokio::task::spawn_blocking(move || coordinator.get_all_instances())
        .await
        .map_err(|e| Error::Internal(format!("listing task failed: {}", e)))
        .and_then(|result| result)
        .and_then(|instances| instances_to_json(&instances));

    match listed {
        Ok(document) => (StatusCode::OK, Json(document)),
        Err(e) => {
            tracing::error!("Failed to list instances: {}", e);
            (e.to_http_status(), Json(json!({ "error": e.to_string() })))
        }
    }
}

async fn get_master(State(state): State<IdentityState>) -> impl IntoResponse {
    let coordinator = &state.coordinator;
    Json(json!({
        "is_master": coordinator.is_master(),
        "asg_name": coordinator.config().asg_name(),
        "dedicated_deployment": coordinator.config().dedicated_deployment_enabled(),
    }))
}
