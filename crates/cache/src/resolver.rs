//! C6: the resolver — profile resolution for a student email (§4.6).
//!
//! The resolver never takes a global snapshot; each lookup it performs is
//! independent (§5: "The resolver reads each of its lookups independently").
//! That's acceptable under the spec's eventual-consistency model and keeps
//! the read path lock-free.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use warden_core::rule::WILDCARD;
use warden_core::{Rule, Scope, Session, Student};

use crate::indexes::IndexSet;
use crate::store::EntityStore;

/// The result of resolving a student's currently-active profiles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Deduplicated union of session-driven and rule-driven profile ids.
    pub profile_ids: HashSet<i64>,
    /// The `S_active` sessions used to compute this resolution — exposed so
    /// the tracker registry (§4.9) can reuse them without re-querying.
    pub active_sessions: Vec<Session>,
    /// Rules active at `now` for this email's scope values, before the
    /// "sessions win over rules" filter (§4.9 step 4) is applied — exposed
    /// so the tracker registry can build rule-context trackers without
    /// recomputing scope derivation itself.
    pub active_rules: Vec<Rule>,
    /// The student this email resolved to, if known (§4.9 heartbeat intake
    /// step 1: "Look up Student; if unknown, return").
    pub student: Option<Student>,
    /// True iff any resolved profile has `trackingEnabled = true` (§4.6:
    /// "If the profile's `trackingEnabled` flag is set for any resolved
    /// profile, the resolver also records a heartbeat"). The cache crate
    /// has no dependency on the tracker crate, so it stops at reporting this
    /// flag — the caller (the HTTP layer, per §6's `track` input) decides
    /// whether to record the heartbeat.
    pub tracking_enabled: bool,
}

pub struct Resolver {
    store: EntityStore,
    indexes: IndexSet,
}

impl Resolver {
    pub fn new(store: EntityStore, indexes: IndexSet) -> Self {
        Self { store, indexes }
    }

    /// §4.6 algorithm, steps 1-6.
    pub fn resolve(&self, email: &str, now: DateTime<Utc>) -> Resolution {
        let todays_sessions = self.indexes.sessions_for_email_today(email, now);
        let active_sessions: Vec<Session> =
            todays_sessions.into_iter().filter(|s| s.is_active_at(now)).collect();

        let mut profile_ids: HashSet<i64> =
            active_sessions.iter().filter_map(|s| s.profile_id).collect();

        let student = self.store.get_student_by_email(email);

        let active_rules = self.active_rules(&active_sessions, student.as_ref(), now);
        for rule in &active_rules {
            profile_ids.insert(rule.profile_id);
        }

        let tracking_enabled = profile_ids
            .iter()
            .filter_map(|id| self.store.get_profile(*id))
            .any(|p| p.tracking_enabled());

        Resolution { profile_ids, active_sessions, active_rules, student, tracking_enabled }
    }

    /// §4.6 step 4-5: rules active at `now` across every scope/value pair
    /// reachable from `active` and `student`, deduplicated by rule id.
    pub fn active_rules(&self, active: &[Session], student: Option<&Student>, now: DateTime<Utc>) -> Vec<Rule> {
        let mut seen = HashSet::new();
        let mut rules = Vec::new();
        for (scope, value) in self.rule_scope_values(active, student) {
            for rule in self.indexes.rules_for(scope, &value) {
                if rule.is_active_at(now) && seen.insert(rule.id) {
                    rules.push(rule);
                }
            }
        }
        rules
    }

    /// §4.6 step 4: derive rule scope/value pairs from `S_active` and the
    /// student record, each scope paired with its wildcard key too.
    fn rule_scope_values(&self, active: &[Session], student: Option<&Student>) -> Vec<(Scope, String)> {
        let mut pairs = Vec::new();

        let mut student_ids: HashSet<i64> = active.iter().map(|s| s.student_id).collect();
        let mut school_ids: HashSet<i64> = active.iter().map(|s| s.school_id).collect();
        let mut grades: HashSet<String> = active.iter().filter_map(|s| s.grade.clone()).collect();
        let mut class_ids: HashSet<i64> = active.iter().filter_map(|s| s.class_id).collect();

        if let Some(student) = student {
            student_ids.insert(student.id);
            school_ids.insert(student.school_id);
            if let Some(grade) = &student.grade {
                grades.insert(grade.clone());
            }
            if let Some(class_id) = student.class_id {
                class_ids.insert(class_id);
            }
        }

        for id in student_ids {
            pairs.push((Scope::Student, id.to_string()));
        }
        for id in school_ids {
            pairs.push((Scope::School, id.to_string()));
        }
        for grade in grades {
            pairs.push((Scope::Grade, grade));
        }
        for id in class_ids {
            pairs.push((Scope::Class, id.to_string()));
        }

        for scope in [Scope::Student, Scope::School, Scope::Grade, Scope::Class] {
            pairs.push((scope, WILDCARD.to_string()));
        }

        pairs
    }
}
