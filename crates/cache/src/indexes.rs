//! C2: derived indexes (§4.2) — `sessionsByEmail`, `sessionsByProfile`,
//! `rulesByScopeAndValue`. Every bucket is a `Vec` published as a whole by
//! `dashmap`'s per-key entry API: a mutator that removes an item from a
//! bucket replaces the bucket's list with a new one while holding that
//! shard's lock, so readers who already hold a cloned list from a prior call
//! never observe a partially-updated one (§5, I6).
//!
//! Key policy (§4.2): when a bucket becomes empty after removal, the outer
//! key is removed too — no empty-list keys survive a mutation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use warden_core::time::is_today;
use warden_core::{Rule, Scope, Session};

type RuleKey = (Scope, String);

#[derive(Clone, Default)]
pub struct IndexSet {
    sessions_by_email: Arc<DashMap<String, Vec<Session>>>,
    sessions_by_profile: Arc<DashMap<i64, Vec<Session>>>,
    rules_by_scope_and_value: Arc<DashMap<RuleKey, Vec<Rule>>>,
}

fn push_unique(bucket: &mut Vec<Session>, session: Session) {
    bucket.retain(|s| s.id != session.id);
    bucket.push(session);
}

impl IndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    // --- sessionsByEmail ---

    /// Index a session under its `student_email` bucket, if set (I1).
    /// Replacing-by-id keeps "list never contains duplicates" (§4.2) true
    /// across repeated UPDATEs for the same session.
    pub fn insert_session_by_email(&self, email: &str, session: Session) {
        self.sessions_by_email
            .entry(email.to_string())
            .and_modify(|bucket| push_unique(bucket, session.clone()))
            .or_insert_with(|| vec![session]);
    }

    /// Remove a session id from an email bucket, collapsing the bucket if it
    /// becomes empty (§4.2 key policy).
    pub fn remove_session_by_email(&self, email: &str, session_id: i64) {
        let mut drop_key = false;
        if let Some(mut bucket) = self.sessions_by_email.get_mut(email) {
            bucket.retain(|s| s.id != session_id);
            drop_key = bucket.is_empty();
        }
        if drop_key {
            self.sessions_by_email.remove(email);
        }
    }

    /// Sessions for `email`, filtered to `start_time.date == today` at read
    /// time regardless of what's physically stored (I5).
    pub fn sessions_for_email_today(&self, email: &str, now: DateTime<Utc>) -> Vec<Session> {
        self.sessions_by_email
            .get(email)
            .map(|bucket| bucket.iter().filter(|s| is_today(s.start_time, now)).cloned().collect())
            .unwrap_or_default()
    }

    // --- sessionsByProfile ---

    /// Index a session under its `profile_id` bucket (I2: only sessions with
    /// a non-null `profile_id` ever appear here).
    pub fn insert_session_by_profile(&self, profile_id: i64, session: Session) {
        self.sessions_by_profile
            .entry(profile_id)
            .and_modify(|bucket| push_unique(bucket, session.clone()))
            .or_insert_with(|| vec![session]);
    }

    pub fn remove_session_by_profile(&self, profile_id: i64, session_id: i64) {
        let mut drop_key = false;
        if let Some(mut bucket) = self.sessions_by_profile.get_mut(&profile_id) {
            bucket.retain(|s| s.id != session_id);
            drop_key = bucket.is_empty();
        }
        if drop_key {
            self.sessions_by_profile.remove(&profile_id);
        }
    }

    pub fn sessions_for_profile(&self, profile_id: i64) -> Vec<Session> {
        self.sessions_by_profile.get(&profile_id).map(|b| b.clone()).unwrap_or_default()
    }

    // --- rulesByScopeAndValue ---

    /// Index a rule under `(scope, scope_value)`. `scope_value` is already
    /// coerced to `""` for wildcards by `warden_core::rule::coerce_scope_value`
    /// before reaching here (I3).
    pub fn insert_rule(&self, rule: Rule) {
        let key = (rule.scope, rule.scope_value.clone());
        self.rules_by_scope_and_value
            .entry(key)
            .and_modify(|bucket| {
                bucket.retain(|r| r.id != rule.id);
                bucket.push(rule.clone());
            })
            .or_insert_with(|| vec![rule]);
    }

    pub fn remove_rule(&self, scope: Scope, scope_value: &str, rule_id: i64) {
        let key = (scope, scope_value.to_string());
        let mut drop_key = false;
        if let Some(mut bucket) = self.rules_by_scope_and_value.get_mut(&key) {
            bucket.retain(|r| r.id != rule_id);
            drop_key = bucket.is_empty();
        }
        if drop_key {
            self.rules_by_scope_and_value.remove(&key);
        }
    }

    /// Rules indexed under `(scope, value)`, unfiltered by time — callers
    /// (the resolver, the cleaner) apply their own `[start, end]` window.
    pub fn rules_for(&self, scope: Scope, value: &str) -> Vec<Rule> {
        self.rules_by_scope_and_value
            .get(&(scope, value.to_string()))
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    /// Drop every bucket. Used by the loader before a full index rebuild
    /// (§4.3 step 5) so a reconnect reload doesn't leave stale entries for
    /// rows that have since been deleted upstream.
    pub fn clear(&self) {
        self.sessions_by_email.clear();
        self.sessions_by_profile.clear();
        self.rules_by_scope_and_value.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(id: i64, email: &str, profile_id: Option<i64>, start: DateTime<Utc>) -> Session {
        Session {
            id,
            title: "t".into(),
            start_time: start,
            end_time: start + Duration::hours(1),
            student_id: 1,
            student_email: Some(email.to_string()),
            class_id: None,
            teacher_id: None,
            school_id: 1,
            teacher_session_id: None,
            grade: None,
            profile_id,
            is_active: None,
            percentage: None,
        }
    }

    #[test]
    fn email_bucket_filters_to_today() {
        let idx = IndexSet::new();
        let now = Utc::now();
        idx.insert_session_by_email("a@test", session(1, "a@test", None, now));
        idx.insert_session_by_email("a@test", session(2, "a@test", None, now - Duration::days(1)));

        let today_only = idx.sessions_for_email_today("a@test", now);
        assert_eq!(today_only.len(), 1);
        assert_eq!(today_only[0].id, 1);
    }

    #[test]
    fn removing_last_entry_collapses_the_key() {
        let idx = IndexSet::new();
        let now = Utc::now();
        idx.insert_session_by_email("a@test", session(1, "a@test", None, now));
        idx.remove_session_by_email("a@test", 1);
        assert!(idx.sessions_for_email_today("a@test", now).is_empty());
        assert!(idx.sessions_by_email.is_empty());
    }

    #[test]
    fn reinserting_same_id_does_not_duplicate() {
        let idx = IndexSet::new();
        let now = Utc::now();
        idx.insert_session_by_email("a@test", session(1, "a@test", None, now));
        idx.insert_session_by_email("a@test", session(1, "a@test", None, now));
        assert_eq!(idx.sessions_for_email_today("a@test", now).len(), 1);
    }

    #[test]
    fn wildcard_rule_reachable_only_via_empty_value() {
        let idx = IndexSet::new();
        let now = Utc::now();
        let rule = Rule {
            id: 1,
            scope: Scope::School,
            scope_value: String::new(),
            start_time: now - Duration::hours(1),
            end_time: now + Duration::hours(1),
            profile_id: 42,
        };
        idx.insert_rule(rule);
        assert_eq!(idx.rules_for(Scope::School, "").len(), 1);
        assert!(idx.rules_for(Scope::School, "1").is_empty());
    }
}
