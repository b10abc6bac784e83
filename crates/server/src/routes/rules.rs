//! `GET /rules` — `schoolRules()` (§6): every rule currently held in the
//! entity store, optionally narrowed to one school via `?school_id=`.
//!
//! The contract list names no arguments for `schoolRules()`, but a rule has
//! no single "school" field of its own for non-School scopes — this reads
//! every rule in the store and lets the caller filter by the School-scope
//! value when a school id is given, which is the only scope a rule can be
//! narrowed to without a student context.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use warden_core::{Rule, Scope};

use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SchoolRulesQuery {
    pub school_id: Option<i64>,
}

#[utoipa::path(get, path = "/rules", params(SchoolRulesQuery), responses((status = 200, body = Vec<Rule>)))]
pub async fn school_rules(State(state): State<Arc<AppState>>, Query(query): Query<SchoolRulesQuery>) -> Json<Vec<Rule>> {
    let rules = state.engine.store.all_rules();
    let filtered = match query.school_id {
        Some(school_id) => rules
            .into_iter()
            .filter(|r| r.scope != Scope::School || r.scope_value == school_id.to_string() || r.is_wildcard())
            .collect(),
        None => rules,
    };
    Json(filtered)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/rules", get(school_rules))
}
