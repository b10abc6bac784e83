use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A student present in the cache.
///
/// Only students with a non-null `email` enter the cache (§3) — the loader
/// and change handlers filter on that before ever constructing one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Student {
    pub id: i64,
    pub email: String,
    pub school_id: i64,
    pub grade: Option<String>,
    pub class_id: Option<i64>,
}

impl Student {
    pub fn new(id: i64, email: String, school_id: i64, grade: Option<String>, class_id: Option<i64>) -> Self {
        Self { id, email, school_id, grade, class_id }
    }
}
