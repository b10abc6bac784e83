//! C3: the loader — initial bulk query and in-order population of C1, then
//! C2 (§4.3). Also used by reconnect-triggered reloads (§4.4), which redo
//! steps 2-5 (everything but the initial student load and the subscribe
//! call itself).

use chrono::{DateTime, Utc};
use tracing::info;
use warden_core::time::forward_window;
use warden_db::queries::{profiles, rules, sessions, students};
use warden_db::Database;

use crate::error::CacheResult;
use crate::indexes::IndexSet;
use crate::store::EntityStore;

/// Loads entities into a store and rebuilds its derived indexes.
///
/// `forward_window_days` is the loader's forward window for rules and
/// sessions (§4.3 steps 3-4, default 7, process-configurable per §6).
pub struct Loader {
    db: Database,
    forward_window_days: u64,
}

impl Loader {
    pub fn new(db: Database, forward_window_days: u64) -> Self {
        Self { db, forward_window_days }
    }

    pub fn forward_window_days(&self) -> u64 {
        self.forward_window_days
    }

    /// Full initial load (§4.3 steps 1-5). No reads may be served on `store`
    /// until this returns — the caller is responsible for not publishing the
    /// store/indexes to readers any earlier (§4.3: "serving before subscribe
    /// is acceptable" refers to step 6 only, not step 5).
    pub async fn load_all(&self, store: &EntityStore, indexes: &IndexSet, now: DateTime<Utc>) -> CacheResult<()> {
        self.load_students(store).await?;
        self.reload_from_step_2(store, indexes, now).await
    }

    /// Steps 2-5 only: profiles, rules, sessions, then a full index rebuild.
    /// This is what a reconnect replays (§4.4: "on reconnect it performs a
    /// full loader pass (step 2-5 of §4.3)") — students are deliberately not
    /// re-walked here, matching the spec's literal step range.
    pub async fn reload_from_step_2(
        &self,
        store: &EntityStore,
        indexes: &IndexSet,
        now: DateTime<Utc>,
    ) -> CacheResult<()> {
        self.load_profiles(store).await?;
        self.load_rules(store, now).await?;
        self.load_sessions(store, now).await?;
        self.rebuild_indexes(store, indexes);
        Ok(())
    }

    async fn load_students(&self, store: &EntityStore) -> CacheResult<()> {
        let loaded = students::fetch_all(self.db.pool()).await?;
        info!(count = loaded.len(), "loaded students");
        for student in loaded {
            store.put_student(student);
        }
        Ok(())
    }

    async fn load_profiles(&self, store: &EntityStore) -> CacheResult<()> {
        let loaded = profiles::fetch_all(self.db.pool()).await?;
        info!(count = loaded.len(), "loaded profiles");
        store.clear_profiles();
        for profile in loaded {
            store.put_profile(profile);
        }
        Ok(())
    }

    async fn load_rules(&self, store: &EntityStore, now: DateTime<Utc>) -> CacheResult<()> {
        let (start, end) = forward_window(now, self.forward_window_days);
        let loaded = rules::fetch_in_window(self.db.pool(), start, end).await?;
        info!(count = loaded.len(), "loaded rules in forward window");
        store.clear_rules();
        for rule in loaded {
            store.put_rule(rule);
        }
        Ok(())
    }

    async fn load_sessions(&self, store: &EntityStore, now: DateTime<Utc>) -> CacheResult<()> {
        let (start, end) = forward_window(now, self.forward_window_days);
        let loaded = sessions::fetch_in_window(self.db.pool(), start, end).await?;
        info!(count = loaded.len(), "loaded sessions in forward window");
        store.clear_sessions();
        for session in loaded {
            store.put_session(session);
        }
        Ok(())
    }

    /// Step 5: a single pass over C1 building both C2 session indexes and
    /// the rule index from scratch.
    fn rebuild_indexes(&self, store: &EntityStore, indexes: &IndexSet) {
        indexes.clear();
        for session in store.all_sessions() {
            if let Some(email) = session.student_email.clone() {
                indexes.insert_session_by_email(&email, session.clone());
            }
            if let Some(profile_id) = session.profile_id {
                indexes.insert_session_by_profile(profile_id, session);
            }
        }
        for rule in store.all_rules() {
            indexes.insert_rule(rule);
        }
    }
}
