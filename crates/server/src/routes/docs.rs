//! OpenAPI documentation, served at `/api/docs` (§11), gated behind the
//! `swagger` feature so release builds can drop the embedded UI assets —
//! exactly as the teacher keeps its dashboard's optional UI bundle out of
//! minimal builds.

use std::sync::Arc;

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use warden_cache::CleanupReport;
use warden_core::{Profile, Rule, Scope, Session, Student};
use warden_tracker::Aggregate;

use crate::error::ErrorResponse;
use crate::routes::health::{self, HealthResponse};
use crate::routes::profiles::{self, ActiveProfilesResponse};
use crate::routes::rules;
use crate::routes::sessions;
use crate::routes::stats::{self, StatsSnapshot};
use crate::routes::tracking::{self, SessionTrackingResponse, StudentAttendance, TeacherTrackingResponse, TrackingStats};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        stats::stats_snapshot,
        sessions::sessions_for_email,
        profiles::active_profiles_for_email,
        rules::school_rules,
        tracking::tracking_stats,
        tracking::session_tracking,
        tracking::teacher_tracking,
    ),
    components(schemas(
        HealthResponse,
        StatsSnapshot,
        ActiveProfilesResponse,
        TrackingStats,
        SessionTrackingResponse,
        StudentAttendance,
        TeacherTrackingResponse,
        ErrorResponse,
        CleanupReport,
        Aggregate,
        Student,
        Profile,
        Rule,
        Scope,
        Session,
    ))
)]
struct ApiDoc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}
