//! `POST /admin/cleanup` — `triggerCleanup()` (§6, §11): run a cleanup pass
//! on demand instead of waiting for the scheduled interval.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use warden_cache::CleanupReport;

use crate::metrics;
use crate::state::AppState;

#[utoipa::path(post, path = "/admin/cleanup", responses((status = 200, body = CleanupReport)))]
pub async fn trigger_cleanup(State(state): State<Arc<AppState>>) -> Json<CleanupReport> {
    let report = state.cleaner().run(Utc::now());
    metrics::record_cleanup(report.sessions_removed, report.rules_removed);
    Json(report)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/admin/cleanup", post(trigger_cleanup))
}
