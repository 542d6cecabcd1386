//! REST API handlers
//!
//! Thin handlers over the target store and metrics registry. Store calls go
//! through [`storage::blocking`] so SQLite never blocks a runtime worker.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::{Error, ErrorCategory, MonitorErrorTrait, Result};
use crate::models::{NewTarget, TargetId, DEFAULT_INTERVAL_SECS};
use crate::storage;

/// Default number of checks returned by the history endpoint
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Upper bound for the history `limit` parameter
pub const MAX_HISTORY_LIMIT: usize = 500;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of every 4xx/5xx response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Body of `POST /targets`
#[derive(Debug, Deserialize)]
pub struct CreateTargetRequest {
    pub url: String,
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: TargetId,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Status page
        .route("/", get(status_page))
        // Operational endpoints
        .route("/healthz", get(health_check))
        .route("/metrics", get(metrics))
        // Target endpoints
        .route("/targets", get(list_targets).post(create_target))
        .route("/targets/{id}", delete(delete_target))
        .route("/targets/{id}/checks", get(target_checks))
        .with_state(state)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self.category() {
            ErrorCategory::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCategory::Parsing => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(
                category = %self.category(),
                recoverable = self.is_recoverable(),
                error = %self,
                "API request failed"
            );
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

fn not_found(id: TargetId) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("Target {id} not found"))),
    )
        .into_response()
}

// ============================================================================
// Operational Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn metrics(State(state): State<AppState>) -> Result<Response> {
    let body = state
        .metrics
        .encode()
        .map_err(|e| Error::with_source("Failed to encode metrics", e))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response())
}

async fn status_page(State(state): State<AppState>) -> Result<Html<String>> {
    let statuses = storage::blocking(&state.store, |s| s.latest_check_per_target()).await?;
    let page = state
        .status_page
        .render(&statuses)
        .map_err(|e| Error::other(format!("Status page rendering failed: {e}")))?;
    Ok(Html(page))
}

// ============================================================================
// Target Handlers
// ============================================================================

async fn list_targets(State(state): State<AppState>) -> Result<Response> {
    let targets = storage::blocking(&state.store, |s| s.list_all_targets()).await?;
    Ok(Json(targets).into_response())
}

async fn create_target(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateTargetRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return Ok(
                (rejection.status(), Json(ErrorResponse::new(rejection.body_text())))
                    .into_response(),
            )
        }
    };

    let new_target = NewTarget::new(&request.url, request.interval_seconds, request.enabled)?;

    let insert = new_target.clone();
    let id = storage::blocking(&state.store, move |s| s.insert_target(&insert)).await?;
    tracing::info!(target_id = id, url = new_target.url(), "Target created");
    Ok((StatusCode::CREATED, Json(new_target.into_target(id))).into_response())
}

async fn delete_target(
    State(state): State<AppState>,
    Path(id): Path<TargetId>,
) -> Result<Response> {
    if !storage::blocking(&state.store, move |s| s.delete_target(id)).await? {
        return Ok(not_found(id));
    }
    tracing::info!(target_id = id, "Target deleted");
    Ok(Json(DeletedResponse { deleted: id }).into_response())
}

async fn target_checks(
    State(state): State<AppState>,
    Path(id): Path<TargetId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let result = storage::blocking(&state.store, move |s| {
        Ok(match s.get_target(id)? {
            Some(_) => Some(s.recent_checks(id, limit)?),
            None => None,
        })
    })
    .await?;

    Ok(match result {
        Some(checks) => Json(checks).into_response(),
        None => not_found(id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationError;
    use crate::storage::StoreError;

    #[test]
    fn test_error_status_mapping() {
        let invalid = Error::from(ValidationError::IntervalTooShort(0)).into_response();
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let store = Error::from(StoreError::LockPoisoned).into_response();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::from(json).into_response().status(), StatusCode::BAD_REQUEST);

        let other = Error::other("template missing").into_response();
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::new("Target 7 not found")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Target 7 not found");
    }
}
