//! `GET /stats` — `statsSnapshot()` (§6): entity-store sizes and tracker
//! registry occupancy, also used to drive the `/metrics` gauges.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct StatsSnapshot {
    pub students: usize,
    pub profiles: usize,
    pub rules: usize,
    pub sessions: usize,
    pub active_session_trackers: usize,
    pub active_rule_trackers: usize,
}

#[utoipa::path(get, path = "/stats", responses((status = 200, body = StatsSnapshot)))]
pub async fn stats_snapshot(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    let snapshot = StatsSnapshot {
        students: state.engine.store.students_len(),
        profiles: state.engine.store.profiles_len(),
        rules: state.engine.store.rules_len(),
        sessions: state.engine.store.sessions_len(),
        active_session_trackers: state.tracker.active_session_tracker_count(),
        active_rule_trackers: state.tracker.active_rule_tracker_count(),
    };

    metrics::set_cache_gauges(snapshot.students, snapshot.sessions, snapshot.rules, snapshot.profiles);
    metrics::set_tracker_gauges(snapshot.active_session_trackers, snapshot.active_rule_trackers);

    Json(snapshot)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/stats", get(stats_snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_serializes_all_fields() {
        let snapshot = StatsSnapshot { students: 1, profiles: 2, rules: 3, sessions: 4, active_session_trackers: 5, active_rule_trackers: 6 };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"sessions\":4"));
    }
}
