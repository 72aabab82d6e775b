//! `opforms serve` -- HTTP JSON API for filling forms.
//!
//! Exposes the fill engine as an async HTTP service using `axum` +
//! `tokio`. Sessions live in memory and disappear once they submit;
//! responses land in the in-memory response store.
//!
//! Endpoints:
//! - GET  /health                      - Server status
//! - GET  /forms                       - List loaded forms
//! - POST /forms                       - Register a form definition
//! - POST /forms/{id}/sessions         - Start a fill session
//! - GET  /sessions/{id}               - Current step, progress, errors
//! - POST /sessions/{id}/answers       - Record one answer
//! - POST /sessions/{id}/advance       - Validate and move forward
//! - POST /sessions/{id}/back          - Step back
//! - GET  /forms/{id}/responses        - Submitted responses, newest first
//!
//! All responses use Content-Type: application/json. CORS is permissive
//! for local development.

mod handlers;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use self::handlers::{
    handle_advance, handle_back, handle_create_session, handle_get_session, handle_health,
    handle_list_forms, handle_list_responses, handle_not_found, handle_put_form,
    handle_record_answer,
};
use self::state::AppState;

/// Maximum request body size: 1 MB. Form definitions and answers are
/// small documents.
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Start the HTTP server on the given port, optionally pre-loading form
/// definitions from disk.
pub async fn start_server(port: u16, form_paths: Vec<PathBuf>) -> Result<(), String> {
    let state = Arc::new(AppState::new());

    for path in &form_paths {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        let doc: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| format!("{} is not valid JSON: {}", path.display(), e))?;
        let form = opforms_engine::Form::from_json(&doc)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        tracing::info!(form_id = %form.id, path = %path.display(), "form pre-loaded");
        state.forms.write().await.insert(form.id.clone(), form);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/forms", get(handle_list_forms).post(handle_put_form))
        .route("/forms/{id}/sessions", post(handle_create_session))
        .route("/forms/{id}/responses", get(handle_list_responses))
        .route("/sessions/{id}", get(handle_get_session))
        .route("/sessions/{id}/answers", post(handle_record_answer))
        .route("/sessions/{id}/advance", post(handle_advance))
        .route("/sessions/{id}/back", post(handle_back))
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(cors)
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("cannot bind {}: {}", addr, e))?;
    tracing::info!(%addr, forms = form_paths.len(), "server listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| format!("server error: {}", e))
}
