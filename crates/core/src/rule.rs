use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::time::active_at;

/// The key the wildcard scope value is coerced to everywhere in the index
/// (§3: "Wildcard rules are modeled as `scopeValue = \"\"` in the index").
pub const WILDCARD: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Student,
    School,
    Grade,
    Class,
}

/// Coerce a nullable/possibly-empty scope value to the index's wildcard
/// convention. NULL and `""` are indistinguishable once coerced (§9 open
/// question, deliberately not resolved here).
pub fn coerce_scope_value(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => WILDCARD.to_string(),
    }
}

/// A restriction rule: active within `[start_time, end_time]` inclusive for
/// entities matching `scope`/`scope_value` (or every entity of that scope,
/// if `scope_value` is the wildcard).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Rule {
    pub id: i64,
    pub scope: Scope,
    /// Already coerced via [`coerce_scope_value`] — never `None`, `""` means
    /// wildcard.
    pub scope_value: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub profile_id: i64,
}

impl Rule {
    pub fn is_wildcard(&self) -> bool {
        self.scope_value == WILDCARD
    }

    /// §3/§8: a rule with `end_time == now` is active (inclusive both ends).
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        active_at(self.start_time, self.end_time, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_none_is_wildcard() {
        assert_eq!(coerce_scope_value(None), WILDCARD);
    }

    #[test]
    fn coerce_empty_is_wildcard() {
        assert_eq!(coerce_scope_value(Some("")), WILDCARD);
    }

    #[test]
    fn coerce_value_passes_through() {
        assert_eq!(coerce_scope_value(Some("7")), "7");
    }
}
