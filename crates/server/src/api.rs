//! HTTP handlers: dashboard validation and registry introspection.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use panelcheck_core::Dashboard;

use crate::state::AppState;

// ── Health ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub schema_kinds: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        schema_kinds: state.registry.current().len(),
    })
}

// ── Validation ────────────────────────────────────────────────────

/// Verdict returned to the caller. On failure, identifies the first
/// offending panel, its declared kind when determinable, and why.
#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub async fn validate(
    State(state): State<Arc<AppState>>,
    Json(dashboard): Json<Dashboard>,
) -> impl IntoResponse {
    match state.validator.validate(&dashboard) {
        Ok(()) => (
            StatusCode::OK,
            Json(ValidateResponse {
                valid: true,
                panel: None,
                kind: None,
                reason: None,
            }),
        ),
        Err(fault) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidateResponse {
                valid: false,
                panel: Some(fault.panel().to_string()),
                kind: fault.kind().map(str::to_string),
                reason: Some(fault.to_string()),
            }),
        ),
    }
}

// ── Schemas ───────────────────────────────────────────────────────

/// Kinds registered in the live snapshot, sorted.
pub async fn schemas_list(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.registry.current().kinds())
}

/// Manual reload trigger; same code path as the watcher.
pub async fn schemas_reload(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.registry.reload() {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            warn!(error = %e, "manual schema reload failed, keeping previous snapshot");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
