//! `GET /sessions/{email}` — `sessionsForEmail(email)` (§6): today's
//! sessions for a student email, straight from the by-email derived index
//! (I5: only sessions whose `startTime.date = today`).

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use warden_core::Session;

use crate::state::AppState;

#[utoipa::path(get, path = "/sessions/{email}", params(("email" = String, Path)), responses((status = 200, body = Vec<Session>)))]
pub async fn sessions_for_email(State(state): State<Arc<AppState>>, Path(email): Path<String>) -> Json<Vec<Session>> {
    Json(state.engine.indexes.sessions_for_email_today(&email, Utc::now()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/sessions/{email}", get(sessions_for_email))
}
