//! C1: the entity store — four independent keyed maps, no cross-entity
//! logic (§4.1). Readers obtain values without copying the map; writers
//! swap whole entity values atomically per key via `dashmap`'s per-shard
//! locking, matching the teacher's `RelayState` (`Arc<DashMap<K, V>>` fields
//! on a `Clone` state struct).

use std::sync::Arc;

use dashmap::DashMap;
use warden_core::{Profile, Rule, Session, Student};

/// Primary keyed mappings for students, profiles, rules, and sessions.
/// Cheap to clone — every field is an `Arc`, so `EntityStore` itself is a
/// handle, not the data.
#[derive(Clone, Default)]
pub struct EntityStore {
    students: Arc<DashMap<i64, Student>>,
    /// Not one of §4.2's formal derived indexes — a small bit of plumbing
    /// the resolver needs since its entry point is an email, not an id, and
    /// §4.1 keeps the primary map keyed by id only.
    students_by_email: Arc<DashMap<String, i64>>,
    profiles: Arc<DashMap<i64, Profile>>,
    rules: Arc<DashMap<i64, Rule>>,
    sessions: Arc<DashMap<i64, Session>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- students ---

    pub fn get_student(&self, id: i64) -> Option<Student> {
        self.students.get(&id).map(|e| e.clone())
    }

    pub fn get_student_by_email(&self, email: &str) -> Option<Student> {
        let id = *self.students_by_email.get(email)?;
        self.get_student(id)
    }

    pub fn put_student(&self, student: Student) {
        if let Some(previous) = self.students.get(&student.id) {
            if previous.email != student.email {
                self.students_by_email.remove(&previous.email);
            }
        }
        self.students_by_email.insert(student.email.clone(), student.id);
        self.students.insert(student.id, student);
    }

    pub fn remove_student(&self, id: i64) -> Option<Student> {
        let removed = self.students.remove(&id).map(|(_, v)| v);
        if let Some(student) = &removed {
            self.students_by_email.remove(&student.email);
        }
        removed
    }

    pub fn students_len(&self) -> usize {
        self.students.len()
    }

    // --- profiles ---

    pub fn get_profile(&self, id: i64) -> Option<Profile> {
        self.profiles.get(&id).map(|e| e.clone())
    }

    pub fn put_profile(&self, profile: Profile) {
        self.profiles.insert(profile.id, profile);
    }

    pub fn remove_profile(&self, id: i64) -> Option<Profile> {
        self.profiles.remove(&id).map(|(_, v)| v)
    }

    pub fn all_profile_ids(&self) -> Vec<i64> {
        self.profiles.iter().map(|e| *e.key()).collect()
    }

    pub fn profiles_len(&self) -> usize {
        self.profiles.len()
    }

    pub fn clear_profiles(&self) {
        self.profiles.clear();
    }

    // --- rules ---

    pub fn get_rule(&self, id: i64) -> Option<Rule> {
        self.rules.get(&id).map(|e| e.clone())
    }

    pub fn put_rule(&self, rule: Rule) {
        self.rules.insert(rule.id, rule);
    }

    pub fn remove_rule(&self, id: i64) -> Option<Rule> {
        self.rules.remove(&id).map(|(_, v)| v)
    }

    pub fn all_rules(&self) -> Vec<Rule> {
        self.rules.iter().map(|e| e.value().clone()).collect()
    }

    pub fn rules_len(&self) -> usize {
        self.rules.len()
    }

    pub fn clear_rules(&self) {
        self.rules.clear();
    }

    // --- sessions ---

    pub fn get_session(&self, id: i64) -> Option<Session> {
        self.sessions.get(&id).map(|e| e.clone())
    }

    pub fn put_session(&self, session: Session) {
        self.sessions.insert(session.id, session);
    }

    pub fn remove_session(&self, id: i64) -> Option<Session> {
        self.sessions.remove(&id).map(|(_, v)| v)
    }

    pub fn all_sessions(&self) -> Vec<Session> {
        self.sessions.iter().map(|e| e.value().clone()).collect()
    }

    pub fn sessions_len(&self) -> usize {
        self.sessions.len()
    }

    pub fn clear_sessions(&self) {
        self.sessions.clear();
    }

    /// All sessions whose `student_id` matches, used by the Student change
    /// handler's email-patch walk (§4.5).
    pub fn sessions_for_student(&self, student_id: i64) -> Vec<Session> {
        self.sessions
            .iter()
            .filter(|e| e.value().student_id == student_id)
            .map(|e| e.value().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn student(id: i64) -> Student {
        Student::new(id, format!("s{id}@test"), 1, None, None)
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = EntityStore::new();
        store.put_student(student(1));
        assert_eq!(store.get_student(1).unwrap().email, "s1@test");
    }

    #[test]
    fn remove_clears_entry() {
        let store = EntityStore::new();
        store.put_student(student(1));
        store.remove_student(1);
        assert!(store.get_student(1).is_none());
    }

    #[test]
    fn email_index_is_cleared_on_remove() {
        let store = EntityStore::new();
        store.put_student(student(1));
        store.remove_student(1);
        assert!(store.get_student_by_email("s1@test").is_none());
    }

    #[test]
    fn sessions_for_student_filters_by_student_id() {
        let store = EntityStore::new();
        let now = Utc::now();
        let session = |id: i64, student_id: i64| Session {
            id,
            title: "t".into(),
            start_time: now,
            end_time: now,
            student_id,
            student_email: None,
            class_id: None,
            teacher_id: None,
            school_id: 1,
            teacher_session_id: None,
            grade: None,
            profile_id: None,
            is_active: None,
            percentage: None,
        };
        store.put_session(session(1, 10));
        store.put_session(session(2, 20));
        store.put_session(session(3, 10));

        let mut ids: Vec<i64> = store.sessions_for_student(10).into_iter().map(|s| s.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 3]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// §8: `INSERT` then `DELETE` on the same id is idempotent — repeating
        /// the delete, or interleaving extra deletes, always leaves the store
        /// in the same empty-for-that-id state, for any id and any number of
        /// repeated deletes.
        #[test]
        fn insert_then_repeated_delete_is_idempotent(id in 0i64..10_000, extra_deletes in 0usize..5) {
            let store = EntityStore::new();
            store.put_student(Student::new(id, format!("s{id}@test"), 1, None, None));
            prop_assert!(store.get_student(id).is_some());

            let first = store.remove_student(id);
            prop_assert!(first.is_some());

            for _ in 0..extra_deletes {
                prop_assert!(store.remove_student(id).is_none());
            }

            prop_assert!(store.get_student(id).is_none());
            prop_assert_eq!(store.students_len(), 0);
        }
    }
}
