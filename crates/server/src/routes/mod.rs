//! API route handlers, one module per §6 contract operation.

pub mod admin;
pub mod health;
pub mod metrics_route;
pub mod profiles;
pub mod rules;
pub mod sessions;
pub mod stats;
pub mod tracking;

#[cfg(feature = "swagger")]
pub mod docs;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// `statsSnapshot()`, `sessionsForEmail(email)`, `activeProfilesForEmail(email,
/// expand, track)`, `schoolRules()`, `triggerCleanup()`, `trackingStats()`,
/// `sessionTracking(sessionId)`, `teacherTracking(teacherId)` (§6), plus
/// `/health` and `/metrics` (§10.1, §11).
pub fn api_routes(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .merge(health::router())
        .merge(stats::router())
        .merge(sessions::router())
        .merge(profiles::router())
        .merge(rules::router())
        .merge(admin::router())
        .merge(tracking::router());

    #[cfg(feature = "swagger")]
    let router = router.merge(docs::router());

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use warden_cache::Engine;
    use warden_db::Database;
    use warden_tracker::TrackerRegistry;

    #[test]
    fn router_construction_does_not_panic() {
        let config = Config::from_env();
        let engine = Engine::new(Database::new_lazy_for_tests(), 7);
        let tracker = TrackerRegistry::new(30);
        let state = AppState::new(config, Database::new_lazy_for_tests(), engine, tracker);
        let _router = api_routes(state);
    }
}
