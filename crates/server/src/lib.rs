//! The HTTP surface (§6, §10): a thin Axum server wrapping the cache
//! engine's resolver/cleaner and the tracker registry.

pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod scheduler;
pub mod state;

pub use config::Config;
pub use metrics::init_metrics;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the full application router, nested under `/api` (matching the
/// teacher's `api_routes(...)` convention), with request tracing attached.
/// `/metrics` is mounted outside the `/api` nest (§10.1: a standard
/// Prometheus scrape path, not an API resource).
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", routes::api_routes(state.clone()))
        .merge(routes::metrics_route::router().with_state(state))
        .layer(TraceLayer::new_for_http())
}
