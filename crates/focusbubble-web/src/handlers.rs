//! Route handlers

use crate::response::{respond, ApiJson, ApiResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use focusbubble_core::{NewBlock, NewSchedule, NewUser, Session};
use focusbubble_engine::StartSession;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Identity sign-in request body
#[derive(Deserialize)]
pub struct TokenRequest {
    pub id_token: String,
}

/// Session start request body; the owner comes from the path
#[derive(Deserialize)]
pub struct StartSessionRequest {
    pub schedule_id: Option<i64>,
    pub duration_minutes: Option<i64>,
}

/// Session as returned over the API, with the state flattened
#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub id: i64,
    pub user_id: i64,
    pub schedule_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub paused: bool,
    pub paused_at: Option<DateTime<Utc>>,
    pub remaining_seconds: Option<i64>,
    pub status: String,
}

impl From<Session> for SessionOut {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            schedule_id: session.schedule_id,
            start_time: session.start_time,
            end_time: session.end_time(),
            paused: session.state.is_paused(),
            paused_at: session.state.paused_at(),
            remaining_seconds: session.state.remaining_secs(),
            status: session.status().to_string(),
        }
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(json!({
        "ok": true,
        "time": state.engine.now(),
    })))
}

pub async fn echo(ApiJson(data): ApiJson<serde_json::Value>) -> impl IntoResponse {
    Json(ApiResponse::ok(json!({
        "received": data,
        "message": "Backend is reachable!",
    })))
}

pub async fn sign_in(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TokenRequest>,
) -> impl IntoResponse {
    respond(state.engine.sign_in(&req.id_token).await)
}

pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NewUser>,
) -> impl IntoResponse {
    respond(state.engine.create_user(&req).await)
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    respond(state.engine.get_user(user_id).await)
}

pub async fn create_schedule(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    ApiJson(req): ApiJson<NewSchedule>,
) -> impl IntoResponse {
    respond(state.engine.create_schedule(user_id, &req).await)
}

pub async fn list_schedules(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    respond(state.engine.list_schedules(user_id).await)
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    Path((user_id, schedule_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    let result = state.engine.delete_schedule(user_id, schedule_id).await;
    respond(result.map(|()| json!({ "ok": true })))
}

pub async fn start_session(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    ApiJson(req): ApiJson<StartSessionRequest>,
) -> impl IntoResponse {
    let start = StartSession {
        user_id,
        schedule_id: req.schedule_id,
        duration_minutes: req.duration_minutes,
    };
    respond(state.engine.start_session(&start).await.map(SessionOut::from))
}

pub async fn pause_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> impl IntoResponse {
    respond(state.engine.pause_session(session_id).await.map(SessionOut::from))
}

pub async fn resume_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> impl IntoResponse {
    respond(state.engine.resume_session(session_id).await.map(SessionOut::from))
}

pub async fn stop_session(
    State(state): State<AppState>,
    Path(session_id): Path<i64>,
) -> impl IntoResponse {
    respond(state.engine.stop_session(session_id).await.map(SessionOut::from))
}

pub async fn list_active_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    let result = state.engine.list_active_sessions(user_id).await;
    respond(result.map(|sessions| {
        sessions
            .into_iter()
            .map(SessionOut::from)
            .collect::<Vec<_>>()
    }))
}

pub async fn create_blocks(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    ApiJson(req): ApiJson<Vec<NewBlock>>,
) -> impl IntoResponse {
    respond(state.engine.blocks().create_direct(user_id, &req).await)
}

pub async fn list_blocks(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    respond(state.engine.blocks().list_active(user_id).await)
}

pub async fn refresh_blocks(State(state): State<AppState>) -> impl IntoResponse {
    let result = state.engine.refresh_blocks().await;
    respond(result.map(|expired| json!({ "expired": expired })))
}
