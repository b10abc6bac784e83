//! C9: the tracker registry (§4.9) — session and rule-context tracker maps,
//! their lookup indexes, and heartbeat intake.
//!
//! Aggregate persistence and the scheduled duties live in `persist.rs`; this
//! module only owns the maps and the read/write paths that don't touch the
//! database.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;
use warden_core::rule::WILDCARD;
use warden_core::time::minutes_between;
use warden_core::{context_key, Rule, Scope, Session, Student};

use crate::minute::MinuteTracker;

/// `sessionId -> SessionTracker`. Created lazily on the first heartbeat that
/// names a session (§3: "Trackers are created lazily on first tracked
/// read").
pub struct SessionTracker {
    pub session_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub total_minutes: i64,
    students: DashMap<String, Arc<MinuteTracker>>,
}

impl SessionTracker {
    fn new(session: &Session) -> Self {
        Self {
            session_id: session.id,
            start: session.start_time,
            end: session.end_time,
            total_minutes: minutes_between(session.start_time, session.end_time),
            students: DashMap::new(),
        }
    }

    fn tracker_for(&self, email: &str) -> Arc<MinuteTracker> {
        self.students.entry(email.to_string()).or_insert_with(|| Arc::new(MinuteTracker::new())).clone()
    }

    fn record_heartbeat(&self, email: &str) {
        self.tracker_for(email).record_heartbeat();
    }

    pub fn rotate(&self) {
        for entry in self.students.iter() {
            entry.value().rotate_minute();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn student_emails(&self) -> Vec<String> {
        self.students.iter().map(|e| e.key().clone()).collect()
    }

    pub fn tracker(&self, email: &str) -> Option<Arc<MinuteTracker>> {
        self.students.get(email).map(|e| e.clone())
    }
}

/// `contextKey -> RuleTracker`, for School/Grade/Class(/Student) rule
/// contexts (§4.9).
pub struct RuleTracker {
    pub context_key: String,
    pub school_id: i64,
    students: DashMap<String, Arc<MinuteTracker>>,
    last_activity: AtomicI64,
}

impl RuleTracker {
    fn new(context_key: String, school_id: i64, now: DateTime<Utc>) -> Self {
        Self { context_key, school_id, students: DashMap::new(), last_activity: AtomicI64::new(now.timestamp()) }
    }

    fn record_heartbeat(&self, email: &str, now: DateTime<Utc>) {
        self.students.entry(email.to_string()).or_insert_with(|| Arc::new(MinuteTracker::new())).record_heartbeat();
        self.last_activity.store(now.timestamp(), Ordering::SeqCst);
    }

    pub fn rotate(&self) {
        for entry in self.students.iter() {
            entry.value().rotate_minute();
        }
    }

    /// §4.10: idle longer than the staleness threshold (default 30 minutes).
    pub fn is_stale(&self, now: DateTime<Utc>, staleness_minutes: i64) -> bool {
        let last = self.last_activity.load(Ordering::SeqCst);
        now.timestamp() - last > staleness_minutes * 60
    }
}

fn push_unique<T: PartialEq>(bucket: &mut Vec<T>, value: T) {
    if !bucket.contains(&value) {
        bucket.push(value);
    }
}

/// Derive a rule's tracker context key from its scope/value plus the
/// tracked student's own school/grade/class — the rule row itself carries
/// no `schoolId` for Grade/Class scopes, only the matched value, so the
/// context is always resolved against the specific student a heartbeat is
/// being recorded for. A wildcard `scopeValue` falls back to that same
/// student's own value, which is the correct per-school/grade/class bucket
/// for *this* heartbeat regardless of how broadly the rule itself matches.
fn context_key_for_rule(rule: &Rule, student: &Student) -> String {
    match rule.scope {
        Scope::School => {
            let school_id = rule.scope_value.parse::<i64>().unwrap_or(student.school_id);
            context_key::school(school_id)
        }
        Scope::Grade => {
            let grade = if rule.scope_value == WILDCARD {
                student.grade.clone().unwrap_or_default()
            } else {
                rule.scope_value.clone()
            };
            context_key::grade(&grade, student.school_id)
        }
        Scope::Class => {
            let class_id = if rule.scope_value == WILDCARD {
                student.class_id.unwrap_or_default()
            } else {
                rule.scope_value.parse::<i64>().unwrap_or_default()
            };
            context_key::class(class_id, student.school_id)
        }
        Scope::Student => {
            let student_id = if rule.scope_value == WILDCARD {
                student.id
            } else {
                rule.scope_value.parse::<i64>().unwrap_or(student.id)
            };
            context_key::student(student_id)
        }
    }
}

fn school_id_for_rule(rule: &Rule, student: &Student) -> i64 {
    match rule.scope {
        Scope::School => rule.scope_value.parse::<i64>().unwrap_or(student.school_id),
        _ => student.school_id,
    }
}

/// C9: session and rule-context tracker maps, plus the three auxiliary
/// indexes named in §4.9 (`studentEmail -> sessionIds`, `teacherId ->
/// sessionIds`, `schoolId -> contextKeys`).
#[derive(Clone)]
pub struct TrackerRegistry {
    session_trackers: Arc<DashMap<i64, Arc<SessionTracker>>>,
    rule_trackers: Arc<DashMap<String, Arc<RuleTracker>>>,
    by_student_email: Arc<DashMap<String, Vec<i64>>>,
    by_teacher: Arc<DashMap<i64, Vec<i64>>>,
    by_school_context: Arc<DashMap<i64, Vec<String>>>,
    rule_staleness_minutes: i64,
}

impl TrackerRegistry {
    pub fn new(rule_staleness_minutes: i64) -> Self {
        Self {
            session_trackers: Arc::new(DashMap::new()),
            rule_trackers: Arc::new(DashMap::new()),
            by_student_email: Arc::new(DashMap::new()),
            by_teacher: Arc::new(DashMap::new()),
            by_school_context: Arc::new(DashMap::new()),
            rule_staleness_minutes,
        }
    }

    /// Heartbeat intake (§4.9 steps 1-5). The caller (the resolver's HTTP
    /// boundary) has already checked `resolution.tracking_enabled` and
    /// resolved the student — if `resolution.student` is `None` the
    /// student is unknown and intake is a no-op (§4.9 step 1).
    pub fn record_heartbeat(&self, resolution: &warden_cache::Resolution, now: DateTime<Utc>) {
        let Some(student) = &resolution.student else {
            debug!("heartbeat intake skipped: student unknown");
            return;
        };

        for session in &resolution.active_sessions {
            let tracker = self.session_tracker_or_create(session);
            tracker.record_heartbeat(&student.email);
            self.index_session(session, &student.email);
        }

        // "Sessions win over rules" (§4.9 step 4): drop rules whose
        // profileId is already covered by an active session.
        let session_profile_ids: std::collections::HashSet<i64> =
            resolution.active_sessions.iter().filter_map(|s| s.profile_id).collect();

        for rule in &resolution.active_rules {
            if session_profile_ids.contains(&rule.profile_id) {
                continue;
            }
            let key = context_key_for_rule(rule, student);
            let school_id = school_id_for_rule(rule, student);
            let tracker = self.rule_tracker_or_create(&key, school_id, now);
            tracker.record_heartbeat(&student.email, now);
            self.index_rule_context(school_id, &key);
        }
    }

    fn session_tracker_or_create(&self, session: &Session) -> Arc<SessionTracker> {
        self.session_trackers.entry(session.id).or_insert_with(|| Arc::new(SessionTracker::new(session))).clone()
    }

    fn rule_tracker_or_create(&self, key: &str, school_id: i64, now: DateTime<Utc>) -> Arc<RuleTracker> {
        self.rule_trackers
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(RuleTracker::new(key.to_string(), school_id, now)))
            .clone()
    }

    fn index_session(&self, session: &Session, email: &str) {
        self.by_student_email.entry(email.to_string()).and_modify(|b| push_unique(b, session.id)).or_insert_with(|| vec![session.id]);
        if let Some(teacher_id) = session.teacher_id {
            self.by_teacher.entry(teacher_id).and_modify(|b| push_unique(b, session.id)).or_insert_with(|| vec![session.id]);
        }
    }

    fn index_rule_context(&self, school_id: i64, key: &str) {
        self.by_school_context
            .entry(school_id)
            .and_modify(|b| push_unique(b, key.to_string()))
            .or_insert_with(|| vec![key.to_string()]);
    }

    /// Every top-of-minute tick (§4.9 scheduled duties): rotate every
    /// tracker in both registries.
    pub fn rotate_all(&self) {
        for entry in self.session_trackers.iter() {
            entry.value().rotate();
        }
        for entry in self.rule_trackers.iter() {
            entry.value().rotate();
        }
    }

    /// Sessions whose `end` has passed `now` — the 5-minute persistence
    /// duty's candidate set (§4.9, §4.10 `Live -> Ending`).
    pub fn ended_sessions(&self, now: DateTime<Utc>) -> Vec<Arc<SessionTracker>> {
        self.session_trackers.iter().filter(|e| e.value().end < now).map(|e| e.value().clone()).collect()
    }

    /// Remove a session tracker and its index entries (called after a
    /// successful or failed persistence attempt — §4.9: "the tracker is
    /// removed either way").
    pub fn remove_session_tracker(&self, session_id: i64) {
        let Some((_, tracker)) = self.session_trackers.remove(&session_id) else { return };
        for email in tracker.student_emails() {
            let mut drop_key = false;
            if let Some(mut ids) = self.by_student_email.get_mut(&email) {
                ids.retain(|id| *id != session_id);
                drop_key = ids.is_empty();
            }
            if drop_key {
                self.by_student_email.remove(&email);
            }
        }
        for mut entry in self.by_teacher.iter_mut() {
            entry.value_mut().retain(|id| *id != session_id);
        }
        self.by_teacher.retain(|_, ids| !ids.is_empty());
    }

    /// The 10-minute staleness sweep (§4.9, §4.10 `Active -> Stale`).
    pub fn remove_stale_rule_trackers(&self, now: DateTime<Utc>) -> usize {
        let stale: Vec<String> = self
            .rule_trackers
            .iter()
            .filter(|e| e.value().is_stale(now, self.rule_staleness_minutes))
            .map(|e| e.key().clone())
            .collect();

        for key in &stale {
            if let Some((_, tracker)) = self.rule_trackers.remove(key) {
                let school_id = tracker.school_id;
                let mut drop_key = false;
                if let Some(mut keys) = self.by_school_context.get_mut(&school_id) {
                    keys.retain(|k| k != key);
                    drop_key = keys.is_empty();
                }
                if drop_key {
                    self.by_school_context.remove(&school_id);
                }
            }
        }
        stale.len()
    }

    pub fn session_tracker(&self, session_id: i64) -> Option<Arc<SessionTracker>> {
        self.session_trackers.get(&session_id).map(|e| e.clone())
    }

    pub fn session_ids_for_teacher(&self, teacher_id: i64) -> Vec<i64> {
        self.by_teacher.get(&teacher_id).map(|e| e.clone()).unwrap_or_default()
    }

    pub fn active_session_tracker_count(&self) -> usize {
        self.session_trackers.len()
    }

    pub fn active_rule_tracker_count(&self) -> usize {
        self.rule_trackers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_cache::Resolution;
    use std::collections::HashSet;

    fn student(id: i64, email: &str, school_id: i64) -> Student {
        Student::new(id, email.to_string(), school_id, Some("9".into()), Some(5))
    }

    fn session(id: i64, student_id: i64, profile_id: Option<i64>, teacher_id: Option<i64>, start: DateTime<Utc>, end: DateTime<Utc>) -> Session {
        Session {
            id,
            title: "t".into(),
            start_time: start,
            end_time: end,
            student_id,
            student_email: None,
            class_id: None,
            teacher_id,
            school_id: 1,
            teacher_session_id: None,
            grade: None,
            profile_id,
            is_active: None,
            percentage: None,
        }
    }

    #[test]
    fn heartbeat_creates_session_tracker_lazily() {
        let registry = TrackerRegistry::new(30);
        let now = Utc::now();
        let s = session(1, 9001, Some(1), Some(500), now - chrono::Duration::minutes(1), now + chrono::Duration::minutes(9));
        let resolution = Resolution {
            profile_ids: HashSet::from([1]),
            active_sessions: vec![s],
            active_rules: vec![],
            student: Some(student(9001, "a@test", 1)),
            tracking_enabled: true,
        };
        registry.record_heartbeat(&resolution, now);
        assert_eq!(registry.active_session_tracker_count(), 1);
        assert_eq!(registry.session_ids_for_teacher(500), vec![1]);
    }

    #[test]
    fn sessions_win_over_rules_with_matching_profile() {
        let registry = TrackerRegistry::new(30);
        let now = Utc::now();
        let s = session(1, 9001, Some(1), None, now - chrono::Duration::minutes(1), now + chrono::Duration::minutes(9));
        let rule = Rule { id: 1, scope: Scope::School, scope_value: "1".into(), start_time: now - chrono::Duration::hours(1), end_time: now + chrono::Duration::hours(1), profile_id: 1 };
        let resolution = Resolution {
            profile_ids: HashSet::from([1]),
            active_sessions: vec![s],
            active_rules: vec![rule],
            student: Some(student(9001, "a@test", 1)),
            tracking_enabled: true,
        };
        registry.record_heartbeat(&resolution, now);
        assert_eq!(registry.active_rule_tracker_count(), 0);
    }

    #[test]
    fn rule_only_heartbeat_creates_rule_tracker() {
        let registry = TrackerRegistry::new(30);
        let now = Utc::now();
        let rule = Rule { id: 2, scope: Scope::School, scope_value: "1".into(), start_time: now - chrono::Duration::hours(1), end_time: now + chrono::Duration::hours(1), profile_id: 2 };
        let resolution = Resolution {
            profile_ids: HashSet::from([2]),
            active_sessions: vec![],
            active_rules: vec![rule],
            student: Some(student(9002, "b@test", 1)),
            tracking_enabled: true,
        };
        registry.record_heartbeat(&resolution, now);
        assert_eq!(registry.active_rule_tracker_count(), 1);
    }

    #[test]
    fn unknown_student_is_a_no_op() {
        let registry = TrackerRegistry::new(30);
        let resolution = Resolution { profile_ids: HashSet::new(), active_sessions: vec![], active_rules: vec![], student: None, tracking_enabled: true };
        registry.record_heartbeat(&resolution, Utc::now());
        assert_eq!(registry.active_session_tracker_count(), 0);
        assert_eq!(registry.active_rule_tracker_count(), 0);
    }

    #[test]
    fn stale_rule_tracker_is_removed_after_threshold() {
        let registry = TrackerRegistry::new(30);
        let start = Utc::now() - chrono::Duration::hours(2);
        let rule = Rule { id: 3, scope: Scope::School, scope_value: "1".into(), start_time: start - chrono::Duration::hours(1), end_time: start + chrono::Duration::hours(5), profile_id: 3 };
        let resolution = Resolution {
            profile_ids: HashSet::from([3]),
            active_sessions: vec![],
            active_rules: vec![rule],
            student: Some(student(9003, "c@test", 1)),
            tracking_enabled: true,
        };
        registry.record_heartbeat(&resolution, start);
        let removed = registry.remove_stale_rule_trackers(start + chrono::Duration::minutes(31));
        assert_eq!(removed, 1);
        assert_eq!(registry.active_rule_tracker_count(), 0);
    }
}
