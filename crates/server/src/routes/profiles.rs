//! `GET /profiles/{email}` — `activeProfilesForEmail(email, expand, track)`
//! (§6): resolves an email's currently-active profile ids, optionally
//! expanding them to full `Profile` bodies, and optionally recording a
//! heartbeat when `track=true` and the resolution opts in (§6: "The `track`
//! input is ignored unless at least one resolved profile has
//! `trackingEnabled = true`").

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use warden_core::Profile;

use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ActiveProfilesQuery {
    #[serde(default)]
    pub expand: bool,
    #[serde(default)]
    pub track: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ActiveProfilesResponse {
    pub profile_ids: Vec<i64>,
    pub profiles: Option<Vec<Profile>>,
}

#[utoipa::path(
    get,
    path = "/profiles/{email}",
    params(("email" = String, Path), ActiveProfilesQuery),
    responses((status = 200, body = ActiveProfilesResponse))
)]
pub async fn active_profiles_for_email(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    Query(query): Query<ActiveProfilesQuery>,
) -> Json<ActiveProfilesResponse> {
    let now = Utc::now();
    let resolution = state.resolver().resolve(&email, now);

    if query.track && resolution.tracking_enabled {
        state.tracker.record_heartbeat(&resolution, now);
    }

    let mut profile_ids: Vec<i64> = resolution.profile_ids.iter().copied().collect();
    profile_ids.sort_unstable();

    let profiles = query
        .expand
        .then(|| profile_ids.iter().filter_map(|id| state.engine.store.get_profile(*id)).collect());

    Json(ActiveProfilesResponse { profile_ids, profiles })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/profiles/{email}", get(active_profiles_for_email))
}
