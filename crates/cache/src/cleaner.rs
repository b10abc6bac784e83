//! C7: the cleaner — scheduled pruning of past-day sessions and expired
//! rules (§4.7). Invoked periodically (default 6h, first run delayed 1h
//! after startup, both process-configurable per §6) and on demand via
//! `triggerCleanup()`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;
use warden_core::time::is_today;

use crate::indexes::IndexSet;
use crate::store::EntityStore;

/// Counts of what a cleanup pass removed, surfaced to `/admin/cleanup` and
/// to the `warden_cleaner_*_removed_total` metrics (§10.1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CleanupReport {
    pub sessions_removed: usize,
    pub rules_removed: usize,
}

pub struct Cleaner {
    store: EntityStore,
    indexes: IndexSet,
}

impl Cleaner {
    pub fn new(store: EntityStore, indexes: IndexSet) -> Self {
        Self { store, indexes }
    }

    /// Remove sessions whose `start_time.date < today`, preserving
    /// "year-long" sessions whose start is in the past but whose end is
    /// still in the future (§4.7: "must be preserved"); remove rules whose
    /// `end_time < now`. Index maintenance goes through the same removal
    /// path as the change handlers.
    pub fn run(&self, now: DateTime<Utc>) -> CleanupReport {
        let mut report = CleanupReport::default();

        for session in self.store.all_sessions() {
            let is_past_day = !is_today(session.start_time, now) && session.start_time < now;
            let still_running = session.end_time >= now;
            if is_past_day && !still_running {
                if let Some(removed) = self.store.remove_session(session.id) {
                    if let Some(email) = &removed.student_email {
                        self.indexes.remove_session_by_email(email, removed.id);
                    }
                    if let Some(profile_id) = removed.profile_id {
                        self.indexes.remove_session_by_profile(profile_id, removed.id);
                    }
                    report.sessions_removed += 1;
                }
            }
        }

        for rule in self.store.all_rules() {
            if rule.end_time < now {
                if self.store.remove_rule(rule.id).is_some() {
                    self.indexes.remove_rule(rule.scope, &rule.scope_value, rule.id);
                    report.rules_removed += 1;
                }
            }
        }

        info!(
            sessions_removed = report.sessions_removed,
            rules_removed = report.rules_removed,
            "cleanup pass complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use warden_core::{Rule, Scope, Session};

    fn session(id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Session {
        Session {
            id,
            title: "t".into(),
            start_time: start,
            end_time: end,
            student_id: 1,
            student_email: Some("s@test".into()),
            class_id: None,
            teacher_id: None,
            school_id: 1,
            teacher_session_id: None,
            grade: None,
            profile_id: None,
            is_active: None,
            percentage: None,
        }
    }

    #[test]
    fn removes_sessions_that_started_before_today() {
        let store = EntityStore::new();
        let indexes = IndexSet::new();
        let now = Utc::now();

        let stale = session(1, now - Duration::days(2), now - Duration::days(2) + Duration::hours(1));
        store.put_session(stale.clone());
        indexes.insert_session_by_email("s@test", stale);

        let report = Cleaner::new(store.clone(), indexes.clone()).run(now);
        assert_eq!(report.sessions_removed, 1);
        assert!(store.get_session(1).is_none());
        assert!(indexes.sessions_for_email_today("s@test", now).is_empty());
    }

    #[test]
    fn preserves_year_long_sessions_still_running() {
        let store = EntityStore::new();
        let indexes = IndexSet::new();
        let now = Utc::now();

        let year_long = session(2, now - Duration::days(100), now + Duration::days(100));
        store.put_session(year_long);

        let report = Cleaner::new(store.clone(), indexes).run(now);
        assert_eq!(report.sessions_removed, 0);
        assert!(store.get_session(2).is_some());
    }

    #[test]
    fn removes_expired_rules() {
        let store = EntityStore::new();
        let indexes = IndexSet::new();
        let now = Utc::now();

        let rule = Rule {
            id: 1,
            scope: Scope::School,
            scope_value: "1".into(),
            start_time: now - Duration::days(2),
            end_time: now - Duration::hours(1),
            profile_id: 1,
        };
        store.put_rule(rule.clone());
        indexes.insert_rule(rule);

        let report = Cleaner::new(store.clone(), indexes.clone()).run(now);
        assert_eq!(report.rules_removed, 1);
        assert!(indexes.rules_for(Scope::School, "1").is_empty());
    }
}
