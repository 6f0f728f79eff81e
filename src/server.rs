//! JSON-over-HTTP tool server.
//!
//! Serves the documentation tools from a single, already-built
//! [`DocsIndex`]. Every tool, built-in or custom, is dispatched through the
//! same `POST /tools/{name}` handler.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Status, version, and index size |
//! | `GET`  | `/tools/list` | All registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call a tool; response is `{ "result": ... }` |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "search_docs: query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `tool_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::config::Config;
use crate::index::DocsIndex;
use crate::traits::{ToolContext, ToolInfo, ToolRegistry};

/// Shared state for all route handlers.
#[derive(Clone)]
struct AppState {
    index: Arc<DocsIndex>,
    tools: Arc<ToolRegistry>,
}

/// Build the router for `index` and `tools`. Exposed for embedding and tests.
pub fn router(index: Arc<DocsIndex>, tools: Arc<ToolRegistry>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .layer(cors)
        .with_state(AppState { index, tools })
}

/// Serve the built-in tools on `[server].bind` until the process exits.
pub async fn run_server(config: &Config, index: Arc<DocsIndex>) -> anyhow::Result<()> {
    run_server_with_extensions(config, index, ToolRegistry::with_builtins()).await
}

/// Like [`run_server`], with a caller-supplied registry (built-ins plus
/// any custom tools).
pub async fn run_server_with_extensions(
    config: &Config,
    index: Arc<DocsIndex>,
    tools: ToolRegistry,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    for t in tools.tools() {
        debug!(tool = t.name(), builtin = t.is_builtin(), "registered tool");
    }

    let app = router(index, Arc::new(tools));
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("tool server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: &'a str,
}

/// A failed request. The wire `code` is derived from the status.
struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn code(&self) -> &'static str {
        match self.status {
            StatusCode::BAD_REQUEST => "bad_request",
            StatusCode::NOT_FOUND => "not_found",
            _ => "tool_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: &self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Map a tool failure to a status by its message, so tools can signal
/// client errors without a dedicated error type in the `Tool` trait.
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let reason = err.to_string();
    let status = if reason.contains("not found") {
        StatusCode::NOT_FOUND
    } else if reason.contains("must not be empty") || reason.contains("invalid") {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    AppError::new(status, format!("{tool_name}: {reason}"))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    documents: usize,
    headings: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.index.snapshot();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: snapshot.documents.len(),
        headings: snapshot.headings.len(),
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo::from_tool(t.as_ref()))
        .collect();
    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, format!("unknown tool: {name}")))?;

    if !params.is_object() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "parameters must be a JSON object",
        ));
    }

    let ctx = ToolContext::new(state.index.clone());
    let result = tool
        .execute(params, &ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}
