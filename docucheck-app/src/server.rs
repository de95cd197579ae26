//! HTTP surface over the tool registry.

use crate::error::AppError;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use docucheck_protocol::{ToolError, ToolErrorCode, ToolInvokeContext, ToolInvokeRequest};
use docucheck_registry::ToolRegistry;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub const USER_HEADER: &str = "x-user-id";
pub const SESSION_HEADER: &str = "x-session-id";
pub const TRACE_HEADER: &str = "x-trace-id";
pub const ROLES_HEADER: &str = "x-roles";

struct ServerState {
    registry: Arc<ToolRegistry>,
}

pub fn router(registry: Arc<ToolRegistry>, max_body_bytes: usize) -> Router {
    let state = Arc::new(ServerState { registry });
    Router::new()
        .route("/tools", get(list_tools))
        .route("/invoke", post(invoke))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, app: Router) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind {addr}: {e}")))?;
    info!(%addr, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn list_tools(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(state.registry.list_tools())
}

async fn health(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "tools": state.registry.count() }))
}

async fn invoke(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let Some(context) = context_from_headers(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": format!("missing {USER_HEADER} header") })),
        )
            .into_response();
    };

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let status = rejection.status();
            let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                ToolErrorCode::PayloadTooLarge
            } else {
                ToolErrorCode::ValidationFailed
            };
            return (status, Json(ToolError::new(code, rejection.body_text()))).into_response();
        }
    };

    let request: ToolInvokeRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            let err = ToolError::validation(format!("Malformed invoke request: {e}"));
            return error_response(err);
        }
    };

    match state.registry.invoke(request, context).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Builds the auth-derived context. `None` when the caller is anonymous.
pub fn context_from_headers(headers: &HeaderMap) -> Option<ToolInvokeContext> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let user_id = header(USER_HEADER)?;
    let session_id = header(SESSION_HEADER).unwrap_or("anonymous-session");
    let mut context = ToolInvokeContext::new(user_id, session_id);
    if let Some(trace_id) = header(TRACE_HEADER) {
        context = context.with_trace_id(trace_id);
    }
    if let Some(roles) = header(ROLES_HEADER) {
        context = context.with_metadata("roles", roles);
    }
    Some(context)
}

pub fn status_for(code: ToolErrorCode) -> StatusCode {
    match code {
        ToolErrorCode::NotFound => StatusCode::NOT_FOUND,
        ToolErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ToolErrorCode::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
        ToolErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ToolErrorCode::ExecutionFailed => StatusCode::INTERNAL_SERVER_ERROR,
        ToolErrorCode::RegistryConflict => StatusCode::CONFLICT,
    }
}

fn error_response(err: ToolError) -> Response {
    (status_for(err.code), Json(err)).into_response()
}
