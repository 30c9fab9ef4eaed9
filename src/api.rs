//! REST API Server for the HR Assistant
//!
//! Exposes the assistant and the raw HR lookups via HTTP endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::agent::{enhance_query, HrAssistant};
use crate::plugin::HrPlugin;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueryRequest {
    pub query: String,
    pub employee_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PolicySearchRequest {
    pub query: String,
    pub n_results: Option<usize>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn bad_request(message: &str) -> ApiResult {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(message.to_string())),
    )
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub assistant: Arc<HrAssistant>,
    pub plugin: Arc<HrPlugin>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<ApiResponse> {
    Json(ApiResponse::success(serde_json::json!({
        "status": "healthy",
        "functions": state.assistant.registry().list(),
    })))
}

/// =============================
/// Assistant Endpoint
/// =============================

async fn run_query(State(state): State<ApiState>, Json(req): Json<QueryRequest>) -> ApiResult {
    if req.query.trim().is_empty() {
        return bad_request("Query must not be empty");
    }

    let query = enhance_query(&req.query, req.employee_name.as_deref());
    info!("Received HR query: {}", query);

    match state.assistant.ask(&query).await {
        Ok(reply) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "query": query,
                "answer": reply.answer,
                "functions": reply.selected_functions(),
                "invocations": reply.invocations,
            }))),
        ),
        Err(e) => {
            warn!(error = %e, "HR query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Error processing request: {}", e))),
            )
        }
    }
}

/// =============================
/// Direct Lookups
/// =============================

async fn leave_balance(State(state): State<ApiState>, Path(employee): Path<String>) -> ApiResult {
    match state.plugin.lookup_balance(&employee).await {
        Ok(Some(balance)) => (StatusCode::OK, Json(ApiResponse::success(balance))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!(
                "No leave record found for {}.",
                employee
            ))),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!(
                "Error retrieving leave balance: {}",
                e
            ))),
        ),
    }
}

async fn policy_search(
    State(state): State<ApiState>,
    Json(req): Json<PolicySearchRequest>,
) -> ApiResult {
    if req.query.trim().is_empty() {
        return bad_request("Query must not be empty");
    }

    let n_results = req.n_results.unwrap_or(1);

    match state.plugin.policies().query(&req.query, n_results).await {
        Ok(matches) => (StatusCode::OK, Json(ApiResponse::success(matches))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!(
                "Error retrieving policy information: {}",
                e
            ))),
        ),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(assistant: Arc<HrAssistant>, plugin: Arc<HrPlugin>) -> Router {
    let state = ApiState { assistant, plugin };

    Router::new()
        .route("/health", get(health))
        .route("/api/query", post(run_query))
        .route("/api/leave-balance/:employee", get(leave_balance))
        .route("/api/policy/search", post(policy_search))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    assistant: Arc<HrAssistant>,
    plugin: Arc<HrPlugin>,
    port: u16,
) -> crate::Result<()> {
    let router = create_router(assistant, plugin);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
