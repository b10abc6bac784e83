//! `GET /tracking/stats`, `/tracking/sessions/{id}`, `/tracking/teachers/{id}`
//! — `trackingStats()`, `sessionTracking(sessionId)`, `teacherTracking(teacherId)`
//! (§6): read-only views over the tracker registry's in-memory state.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use warden_tracker::{compute_aggregate, SessionTracker, TrackerError};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct TrackingStats {
    pub active_session_trackers: usize,
    pub active_rule_trackers: usize,
}

#[utoipa::path(get, path = "/tracking/stats", responses((status = 200, body = TrackingStats)))]
pub async fn tracking_stats(State(state): State<Arc<AppState>>) -> Json<TrackingStats> {
    Json(TrackingStats {
        active_session_trackers: state.tracker.active_session_tracker_count(),
        active_rule_trackers: state.tracker.active_rule_tracker_count(),
    })
}

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct StudentAttendance {
    pub email: String,
    pub is_currently_active: bool,
    pub last_3_minutes: Vec<bool>,
    pub total_active_minutes: i64,
    pub percentage: f64,
    pub is_active: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct SessionTrackingResponse {
    pub session_id: i64,
    pub total_minutes: i64,
    pub students: Vec<StudentAttendance>,
}

fn session_tracking_response(tracker: &SessionTracker, threshold: f64) -> SessionTrackingResponse {
    let students = tracker
        .student_emails()
        .into_iter()
        .filter_map(|email| {
            let minute = tracker.tracker(&email)?;
            Some(StudentAttendance {
                is_currently_active: minute.is_currently_active(),
                last_3_minutes: minute.last_3_minutes(),
                total_active_minutes: minute.total_active_minutes(),
                percentage: minute.percentage(tracker.total_minutes),
                is_active: minute.is_active(tracker.total_minutes, threshold),
                email,
            })
        })
        .collect();

    SessionTrackingResponse { session_id: tracker.session_id, total_minutes: tracker.total_minutes, students }
}

#[utoipa::path(get, path = "/tracking/sessions/{id}", params(("id" = i64, Path)), responses((status = 200, body = SessionTrackingResponse), (status = 404)))]
pub async fn session_tracking(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<Json<SessionTrackingResponse>> {
    let tracker = state.tracker.session_tracker(id).ok_or(ApiError::Tracker(TrackerError::UnknownSession { id }))?;
    Ok(Json(session_tracking_response(&tracker, state.config.activity_threshold)))
}

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct TeacherTrackingResponse {
    pub teacher_id: i64,
    pub sessions: Vec<SessionTrackingResponse>,
}

#[utoipa::path(get, path = "/tracking/teachers/{id}", params(("id" = i64, Path)), responses((status = 200, body = TeacherTrackingResponse)))]
pub async fn teacher_tracking(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Json<TeacherTrackingResponse> {
    let threshold = state.config.activity_threshold;
    let sessions = state
        .tracker
        .session_ids_for_teacher(id)
        .into_iter()
        .filter_map(|session_id| state.tracker.session_tracker(session_id))
        .map(|tracker| session_tracking_response(&tracker, threshold))
        .collect();

    Json(TeacherTrackingResponse { teacher_id: id, sessions })
}

pub async fn session_aggregate(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<Json<Option<warden_tracker::Aggregate>>> {
    let tracker = state.tracker.session_tracker(id).ok_or(ApiError::Tracker(TrackerError::UnknownSession { id }))?;
    Ok(Json(compute_aggregate(&tracker, state.config.activity_threshold)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tracking/stats", get(tracking_stats))
        .route("/tracking/sessions/{id}", get(session_tracking))
        .route("/tracking/sessions/{id}/aggregate", get(session_aggregate))
        .route("/tracking/teachers/{id}", get(teacher_tracking))
}
