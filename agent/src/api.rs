use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use common::{EventPage, EventSubmission, SecurityEvent, SecurityStats, StatsPatch, SystemHealth, ValidationError};
use log::{info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::cors::CorsLayer;

use crate::auth::{AuthError, Identity, Session};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("missing bearer token")]
    MissingToken,
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(AuthError::SigningFailed) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(_) | ApiError::MissingToken => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Auth(AuthError::InvalidCredentials) => "invalid_credentials",
            ApiError::Auth(AuthError::TokenExpired) => "token_expired",
            ApiError::Auth(AuthError::Revoked) => "token_revoked",
            ApiError::Auth(AuthError::SigningFailed) => "internal_error",
            ApiError::Auth(AuthError::InvalidToken) | ApiError::MissingToken => "invalid_token",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        if let ApiError::Validation(ref e) = self {
            error["field"] = json!(e.field());
        }
        (self.status_code(), Json(json!({ "success": false, "error": error }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/events", get(list_events).post(submit_event))
        .route("/api/stats", get(get_stats).post(update_stats))
        .route("/api/health", get(get_health))
        .route("/api/status", get(agent_status))
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify", get(verify))
        .route("/api/auth/logout", post(logout))
        .fallback(fallback)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    page: Option<usize>,
    limit: Option<usize>,
}

async fn list_events(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<EventPage>> {
    let Query(params) = params?;
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(state.default_page_size);
    Ok(Json(state.events.read().await.list(page, limit)))
}

async fn submit_event(
    State(state): State<AppState>,
    body: Result<Json<EventSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SecurityEvent>)> {
    let Json(submission) = body?;
    let event = state.events.write().await.submit(submission, Utc::now()).map_err(|e| {
        warn!("Rejected event submission: {}", e);
        e
    })?;
    info!("Accepted {} event {} ({})", event.kind, event.id, event.outcome);
    Ok((StatusCode::CREATED, Json(event)))
}

async fn get_stats(State(state): State<AppState>) -> Json<SecurityStats> {
    Json(state.stats.read().await.snapshot())
}

async fn update_stats(
    State(state): State<AppState>,
    body: Result<Json<StatsPatch>, JsonRejection>,
) -> ApiResult<Json<SecurityStats>> {
    let Json(patch) = body?;
    if patch.is_empty() {
        info!("Stats update carried no known counters");
    }
    let stats = state.stats.write().await.apply(&patch);
    Ok(Json(stats))
}

async fn get_health(State(state): State<AppState>) -> Json<SystemHealth> {
    Json(state.health.read().await.snapshot())
}

async fn agent_status(State(state): State<AppState>) -> Json<Value> {
    let (size, capacity, counts) = {
        let store = state.events.read().await;
        (store.len(), store.capacity(), store.counts())
    };
    let system_status = state.stats.read().await.snapshot().system_status;

    Json(json!({
        "status": "running",
        "uptimeSeconds": state.uptime_secs(),
        "systemStatus": system_status.as_str(),
        "events": {
            "stored": size,
            "capacity": capacity,
            "badgeAccess": counts.badge_access,
            "denialOfService": counts.denial_of_service,
            "threats": counts.threats,
        }
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<Session>> {
    let Json(request) = body?;
    let session = state.auth.login(&request.username, &request.password, Utc::now())?;
    Ok(Json(session))
}

async fn verify(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let token = bearer_token(&headers)?;
    let identity: Identity = state.auth.verify(token, Utc::now())?;
    Ok(Json(json!({ "valid": true, "user": identity })))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let token = bearer_token(&headers)?;
    state.auth.logout(token, Utc::now())?;
    Ok(Json(json!({ "success": true })))
}

fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::MissingToken)
}

async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": { "code": "not_found", "message": "The requested resource was not found" }
        })),
    )
}
