//! C5: change handlers (§4.5). Each handler is total and idempotent: it
//! mutates C1 and atomically updates C2, and re-fetches from the database
//! rather than trusting notification payload fields beyond `operation`/`id`
//! (§4.4: "Payloads are JSON objects carrying at least `operation` and
//! `id`"). Dispatched on the subscriber's delivery loop (§5: "changes for
//! the same id must be processed in arrival order" — the subscriber
//! upholds that by running one delivery loop per channel).

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use warden_core::time::forward_window;
use warden_db::queries::{profiles, rules, sessions, students};
use warden_db::{ChangeEvent, Database, Operation};

use crate::error::CacheResult;
use crate::indexes::IndexSet;
use crate::store::EntityStore;

/// Student change (§4.5 Student change).
pub async fn handle_student_change(
    store: &EntityStore,
    indexes: &IndexSet,
    db: &Database,
    event: &ChangeEvent,
) -> CacheResult<()> {
    let Some(id) = event.id else {
        warn!("student change event missing id, dropping");
        return Ok(());
    };

    match event.operation {
        Operation::Delete => {
            store.remove_student(id);
            clear_student_email_from_sessions(store, indexes, id, None);
        }
        Operation::Insert | Operation::Update => {
            let refreshed = students::fetch_one(db.pool(), id).await?;
            match refreshed {
                Some(student) => {
                    let new_email = student.email.clone();
                    store.put_student(student);
                    clear_student_email_from_sessions(store, indexes, id, Some(new_email));
                }
                None => {
                    // No longer present (or email went null): same as DELETE.
                    store.remove_student(id);
                    clear_student_email_from_sessions(store, indexes, id, None);
                }
            }
        }
        Operation::Reload | Operation::ReloadAll => {
            debug!(id, "RELOAD(_ALL) is not meaningful for students, ignoring");
        }
    }
    Ok(())
}

/// Walk every session for `student_id`, patch `student_email`, and rebuild
/// only the old and new email buckets (§4.5: "rebuild only the **old** and
/// **new** email buckets").
fn clear_student_email_from_sessions(
    store: &EntityStore,
    indexes: &IndexSet,
    student_id: i64,
    new_email: Option<String>,
) {
    for mut session in store.sessions_for_student(student_id) {
        let old_email = session.student_email.clone();
        if old_email == new_email {
            continue;
        }
        if let Some(old) = &old_email {
            indexes.remove_session_by_email(old, session.id);
        }
        session.student_email = new_email.clone();
        if let Some(new) = &new_email {
            indexes.insert_session_by_email(new, session.clone());
        }
        store.put_session(session);
    }
}

/// Profile change (§4.5 Profile change).
pub async fn handle_profile_change(
    store: &EntityStore,
    db: &Database,
    event: &ChangeEvent,
) -> CacheResult<()> {
    match event.operation {
        Operation::Delete => {
            if let Some(id) = event.id {
                store.remove_profile(id);
            }
        }
        Operation::Insert | Operation::Update | Operation::Reload => {
            let Some(id) = event.id else {
                warn!("profile {:?} missing id, dropping", event.operation);
                return Ok(());
            };
            match profiles::fetch_one(db.pool(), id).await? {
                Some(profile) => store.put_profile(profile),
                // §4.5 tie-break: "a RELOAD arriving for an id currently absent
                // is a no-op."
                None => {
                    store.remove_profile(id);
                }
            }
        }
        Operation::ReloadAll => {
            let all = profiles::fetch_all(db.pool()).await?;
            store.clear_profiles();
            for profile in all {
                store.put_profile(profile);
            }
        }
    }
    Ok(())
}

/// Rule change (§4.5 Rule change).
pub async fn handle_rule_change(
    store: &EntityStore,
    indexes: &IndexSet,
    db: &Database,
    event: &ChangeEvent,
    forward_window_days: u64,
    now: DateTime<Utc>,
) -> CacheResult<()> {
    let Some(id) = event.id else {
        warn!("rule change event missing id, dropping");
        return Ok(());
    };

    match event.operation {
        Operation::Delete => {
            if let Some(old) = store.remove_rule(id) {
                indexes.remove_rule(old.scope, &old.scope_value, id);
            }
        }
        Operation::Insert | Operation::Update => {
            if let Some(old) = store.remove_rule(id) {
                indexes.remove_rule(old.scope, &old.scope_value, id);
            }
            let (start, end) = forward_window(now, forward_window_days);
            if let Some(rule) = rules::fetch_one_in_window(db.pool(), id, start, end).await? {
                store.put_rule(rule.clone());
                indexes.insert_rule(rule);
            }
        }
        Operation::Reload | Operation::ReloadAll => {
            debug!(id, "RELOAD(_ALL) is not meaningful for rules, ignoring");
        }
    }
    Ok(())
}

/// Session change (§4.5 Session change).
pub async fn handle_session_change(
    store: &EntityStore,
    indexes: &IndexSet,
    db: &Database,
    event: &ChangeEvent,
    forward_window_days: u64,
    now: DateTime<Utc>,
) -> CacheResult<()> {
    let Some(id) = event.id else {
        warn!("session change event missing id, dropping");
        return Ok(());
    };

    match event.operation {
        Operation::Delete => {
            remove_session_from_indexes(store, indexes, id);
        }
        Operation::Insert | Operation::Update => {
            remove_session_from_indexes(store, indexes, id);

            let (start, end) = forward_window(now, forward_window_days);
            if let Some(mut session) = sessions::fetch_one_in_window(db.pool(), id, start, end).await? {
                // §4.5: "look up studentEmail via studentsById" — the cache's
                // own view wins over whatever the row's join produced, since
                // a pending Student change may not have reached the database
                // read yet.
                session.student_email = store.get_student(session.student_id).map(|s| s.email);

                store.put_session(session.clone());
                if let Some(email) = &session.student_email {
                    indexes.insert_session_by_email(email, session.clone());
                }
                if let Some(profile_id) = session.profile_id {
                    indexes.insert_session_by_profile(profile_id, session);
                }
            }
        }
        Operation::Reload | Operation::ReloadAll => {
            debug!(id, "RELOAD(_ALL) is not meaningful for sessions, ignoring");
        }
    }
    Ok(())
}

fn remove_session_from_indexes(store: &EntityStore, indexes: &IndexSet, id: i64) {
    if let Some(old) = store.remove_session(id) {
        if let Some(email) = &old.student_email {
            indexes.remove_session_by_email(email, id);
        }
        if let Some(profile_id) = old.profile_id {
            indexes.remove_session_by_profile(profile_id, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_core::Student;

    fn event(op: Operation, id: Option<i64>) -> ChangeEvent {
        ChangeEvent { operation: op, id, raw: json!({}) }
    }

    #[test]
    fn student_email_patch_rebuilds_old_and_new_buckets_only() {
        let store = EntityStore::new();
        let indexes = IndexSet::new();
        let now = Utc::now();

        let session = warden_core::Session {
            id: 1,
            title: "t".into(),
            start_time: now,
            end_time: now,
            student_id: 7,
            student_email: Some("old@test".into()),
            class_id: None,
            teacher_id: None,
            school_id: 1,
            teacher_session_id: None,
            grade: None,
            profile_id: None,
            is_active: None,
            percentage: None,
        };
        store.put_session(session.clone());
        indexes.insert_session_by_email("old@test", session);

        clear_student_email_from_sessions(&store, &indexes, 7, Some("new@test".into()));

        assert!(indexes.sessions_for_email_today("old@test", now).is_empty());
        assert_eq!(indexes.sessions_for_email_today("new@test", now).len(), 1);
        assert_eq!(store.get_session(1).unwrap().student_email.as_deref(), Some("new@test"));
    }

    #[test]
    fn event_with_no_id_is_distinguishable_from_reload_all() {
        let e = event(Operation::ReloadAll, None);
        assert_eq!(e.id, None);
        let _ = Student::new(1, "x".into(), 1, None, None);
    }
}
