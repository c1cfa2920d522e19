use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::AuthService;
use crate::models::{AggregateRow, DiagnosticRecord, StatisticsSummary};
use crate::pagination::{build_metadata, LinkParams, PageMetadata};
use crate::storage::{DiagnosticsStore, StorageError};
use crate::validate::{
    validate_filters, validate_group_by, validate_pagination, ValidationError,
};

const DIAGNOSTICS_PATH: &str = "/api/diagnostics";

pub struct AppState {
    pub store: Arc<dyn DiagnosticsStore>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(err: ValidationError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Storage failures are terminal for the request: log the detail, return
/// a generic message.
fn internal_error(err: StorageError) -> ApiError {
    tracing::error!("storage failure: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
        }),
    )
}

fn not_found(what: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("{what} not found"),
        }),
    )
}

/// City/state filters echoed back in aggregate and statistics responses,
/// post-normalization.
#[derive(Serialize)]
pub struct FilterEcho {
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub city: Option<String>,
    pub state: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct AggregateQuery {
    pub group_by: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    pub city: Option<String>,
    pub state: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub data: Vec<DiagnosticRecord>,
    pub pagination: PageMetadata,
}

#[derive(Serialize)]
pub struct RecordResponse {
    pub data: DiagnosticRecord,
}

#[derive(Serialize)]
pub struct AggregateResponse {
    pub data: Vec<AggregateRow>,
    pub group_by: &'static str,
    pub filters: FilterEcho,
}

#[derive(Serialize)]
pub struct StatisticsResponse {
    pub data: StatisticsSummary,
    pub filters: FilterEcho,
}

/// GET /api/diagnostics — paginated listing with optional filters.
pub async fn list_diagnostics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let page = validate_pagination(query.page, query.limit).map_err(bad_request)?;
    let filters = validate_filters(
        query.city.as_deref(),
        query.state.as_deref(),
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    )
    .map_err(bad_request)?;

    let (records, total) = state
        .store
        .list_paginated(&filters, &page)
        .await
        .map_err(internal_error)?;

    // Links echo the caller's raw parameters; they were validated above.
    let params = LinkParams {
        city: query.city,
        state: query.state,
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let pagination = build_metadata(total, page.page, page.limit, DIAGNOSTICS_PATH, &params);

    Ok(Json(ListResponse {
        data: records,
        pagination,
    }))
}

/// GET /api/diagnostics/{id} — single-record lookup.
pub async fn get_diagnostic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<RecordResponse>, ApiError> {
    match state.store.get_by_id(id).await.map_err(internal_error)? {
        Some(record) => Ok(Json(RecordResponse { data: record })),
        None => Err(not_found("Diagnostic")),
    }
}

/// GET /api/diagnostics/aggregate — grouped aggregation by day/city/state.
pub async fn get_aggregated(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AggregateQuery>,
) -> Result<Json<AggregateResponse>, ApiError> {
    let group = validate_group_by(query.group_by.as_deref().unwrap_or("day"))
        .map_err(bad_request)?;
    let filters = validate_filters(
        query.city.as_deref(),
        query.state.as_deref(),
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    )
    .map_err(bad_request)?;

    let data = state
        .store
        .get_aggregated(&filters, group)
        .await
        .map_err(internal_error)?;

    Ok(Json(AggregateResponse {
        data,
        group_by: group.as_str(),
        filters: FilterEcho {
            city: filters.city,
            state: filters.state,
        },
    }))
}

/// GET /api/diagnostics/statistics — summary over the filtered set.
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let filters = validate_filters(
        query.city.as_deref(),
        query.state.as_deref(),
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    )
    .map_err(bad_request)?;

    let data = state
        .store
        .get_statistics(&filters)
        .await
        .map_err(internal_error)?;

    Ok(Json(StatisticsResponse {
        data,
        filters: FilterEcho {
            city: filters.city,
            state: filters.state,
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/auth/login — issue a bearer token for the admin credentials.
pub async fn login(
    State(auth): State<Arc<AuthService>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<MessageResponse>)> {
    if !auth.check_credentials(&payload.username, &payload.password) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(MessageResponse {
                message: "Unauthorized".to_string(),
            }),
        ));
    }

    match auth.issue_token(&payload.username) {
        Ok(token) => Ok(Json(LoginResponse { token })),
        Err(e) => {
            tracing::error!("failed to issue token: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse {
                    message: "Internal server error".to_string(),
                }),
            ))
        }
    }
}

/// GET /api/auth/verify — check the caller's token.
pub async fn verify(
    State(auth): State<Arc<AuthService>>,
    headers: axum::http::HeaderMap,
) -> Result<Json<MessageResponse>, (StatusCode, Json<MessageResponse>)> {
    if auth.is_authorized(&headers) {
        Ok(Json(MessageResponse {
            message: "Token is valid".to_string(),
        }))
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(MessageResponse {
                message: "Invalid token".to_string(),
            }),
        ))
    }
}

/// GET /api/health
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}
