//! `GET /metrics` (§10.1, §11): Prometheus scrape endpoint. Deliberately
//! outside the `/api` nest — matches the teacher's note that `/metrics` is
//! a standard Prometheus path, not an API resource.

use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::metrics::render_metrics;
use crate::state::AppState;

pub async fn metrics_handler() -> Response {
    match render_metrics() {
        Some(output) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")], output)
                .into_response()
        }
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics not initialized").into_response(),
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/metrics", get(metrics_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::config::Config;
    use warden_cache::Engine;
    use warden_db::Database;
    use warden_tracker::TrackerRegistry;

    #[tokio::test]
    async fn metrics_endpoint_returns_text_after_init() {
        crate::metrics::init_metrics();
        let config = Config::from_env();
        let engine = Engine::new(Database::new_lazy_for_tests(), 7);
        let tracker = TrackerRegistry::new(30);
        let state = AppState::new(config, Database::new_lazy_for_tests(), engine, tracker);
        let app = router().with_state(state);

        let response = app.oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
