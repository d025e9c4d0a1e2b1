//! REST API handlers
//!
//! Thin adapters from HTTP to [`Registry`](crate::service::Registry) calls.

use super::dto::*;
use super::state::AppState;
use crate::Error;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// Convert a registry error to an API response
fn error_response(context: &str, err: Error) -> (StatusCode, Json<ApiError>) {
    let message = format!("{}: {}", context, err);

    let (status, error) = match &err {
        Error::InvalidName(_) | Error::InvalidBlock(_) => {
            (StatusCode::BAD_REQUEST, ApiError::bad_request(message))
        }
        Error::DuplicateName(_) | Error::DuplicateBlock(_) => {
            (StatusCode::CONFLICT, ApiError::conflict(message))
        }
        Error::PoolExhausted(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::pool_exhausted(message),
        ),
        Error::StoreUnavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ApiError::unavailable(message),
        ),
        Error::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, ApiError::timeout(message)),
        Error::Config(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::internal(message),
        ),
    };

    if err.is_client_error() {
        tracing::debug!(error = %err, "{}", context);
    } else {
        tracing::error!(error = %err, "{}", context);
    }

    (status, Json(error))
}

fn bad_request(message: &str) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(message)))
}

// ============================================================================
// Record Handlers
// ============================================================================

/// List all records, sorted by key
pub async fn list_records(State(state): State<Arc<AppState>>) -> ApiResult<Json<ListResponse>> {
    let records = state
        .registry
        .list()
        .await
        .map_err(|e| error_response("failed to get CIDRs", e))?;

    Ok(Json(ListResponse::new(records)))
}

/// Suggest the next free block from the pool
pub async fn next_available(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<NextResponse>> {
    let next = state
        .registry
        .next_available()
        .await
        .map_err(|e| error_response("failed to get next available CIDR", e))?;

    Ok(Json(NextResponse {
        cidr: next.to_string(),
    }))
}

/// Register a block under a key
pub async fn register_record(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let Json(req) = body.map_err(|_| bad_request("invalid JSON body"))?;

    if req.key.is_empty() || req.cidr.is_empty() {
        return Err(bad_request("both key and cidr fields are required"));
    }

    let record = state
        .registry
        .register(&req.key, &req.cidr)
        .await
        .map_err(|e| error_response("failed to register CIDR", e))?;

    Ok((StatusCode::CREATED, Json(RegisterResponse::new(record))))
}

/// Release the block held by a key given in the path
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    release(&state, key).await
}

/// Release the record named `next`, whose path the static next route matches
pub async fn delete_record_named_next(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DeleteResponse>> {
    release(&state, "next".to_string()).await
}

async fn release(state: &AppState, key: String) -> ApiResult<Json<DeleteResponse>> {
    if key.is_empty() {
        return Err(bad_request("key parameter is required"));
    }

    state
        .registry
        .delete(&key)
        .await
        .map_err(|e| error_response("failed to delete CIDR", e))?;

    Ok(Json(DeleteResponse::new(key)))
}

// ============================================================================
// Root Handlers
// ============================================================================

/// `GET /`: list, or next-available when `?action=next`
pub async fn root_get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RootQuery>,
) -> Response {
    if query.action.as_deref() == Some("next") {
        next_available(State(state)).await.into_response()
    } else {
        list_records(State(state)).await.into_response()
    }
}

/// `DELETE /?key=...`
pub async fn root_delete(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RootQuery>,
) -> ApiResult<Json<DeleteResponse>> {
    release(&state, query.key.unwrap_or_default()).await
}

/// Plain (non-preflight) OPTIONS requests
pub async fn options_ok() -> StatusCode {
    StatusCode::OK
}

/// Fallback for unsupported methods on registry routes
pub async fn method_not_allowed() -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ApiError::method_not_allowed()),
    )
}

// ============================================================================
// Health Handlers
// ============================================================================

/// Liveness check
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check: the record store must answer a scan
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.registry.list().await {
        Ok(_) => (StatusCode::OK, "READY"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }
}
