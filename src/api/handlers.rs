use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::core::metrics;
use crate::core::state::AppState;
use crate::schemas::{HealthResponse, RootResponse};

pub(crate) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: state.settings().api().project_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_prefix: state.settings().api().api_v1_str.clone(),
    })
}

pub(crate) async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let mut components = BTreeMap::new();

    let (code, status) = match state.catalog().ping().await {
        Ok(()) => {
            components.insert("database".to_string(), "healthy".to_string());
            (StatusCode::OK, "healthy")
        }
        Err(err) => {
            tracing::warn!(error = %err, "Health check failed to reach the catalog");
            components.insert("database".to_string(), "unhealthy".to_string());
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        code,
        Json(HealthResponse {
            service: "exam-service".to_string(),
            status: status.to_string(),
            components,
        }),
    )
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
