use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::time::active_at;

/// A scheduled session for a student, optionally carrying its own
/// restriction profile. `is_active`/`percentage` are aggregate fields
/// written only by the tracker when the session ends (§3, §4.9) — never by
/// the loader or change handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub id: i64,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub student_id: i64,
    /// Denormalized from `Student.email` at index time (I1). `None` if the
    /// student was unknown or has since been deleted.
    pub student_email: Option<String>,
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub school_id: i64,
    pub teacher_session_id: Option<i64>,
    pub grade: Option<String>,
    pub profile_id: Option<i64>,
    pub is_active: Option<bool>,
    pub percentage: Option<f64>,
}

impl Session {
    /// §4.6 step 2: `now` lies within `[start_time, end_time]` inclusive.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        active_at(self.start_time, self.end_time, now)
    }
}
