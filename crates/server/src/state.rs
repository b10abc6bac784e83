//! Shared application state (§10.3) — the cache engine, tracker registry,
//! database handle, and config, all handed to every route via Axum's
//! `State` extractor.

use std::sync::Arc;
use std::time::Instant;

use warden_cache::{Cleaner, Engine, Resolver};
use warden_db::Database;
use warden_tracker::TrackerRegistry;

use crate::config::Config;

pub struct AppState {
    pub start_time: Instant,
    pub config: Config,
    pub db: Database,
    pub engine: Engine,
    pub tracker: TrackerRegistry,
}

impl AppState {
    pub fn new(config: Config, db: Database, engine: Engine, tracker: TrackerRegistry) -> Arc<Self> {
        Arc::new(Self { start_time: Instant::now(), config, db, engine, tracker })
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.engine.store.clone(), self.engine.indexes.clone())
    }

    pub fn cleaner(&self) -> Cleaner {
        Cleaner::new(self.engine.store.clone(), self.engine.indexes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            database_url: String::new(),
            port: 0,
            forward_window_days: 7,
            cleanup_interval_hours: 6,
            startup_cleanup_delay_hours: 1,
            rule_tracker_staleness_minutes: 30,
            activity_threshold: 0.8,
        }
    }

    #[test]
    fn uptime_starts_near_zero() {
        let engine = Engine::new(Database::new_lazy_for_tests(), 7);
        let tracker = TrackerRegistry::new(30);
        let state = AppState::new(test_config(), Database::new_lazy_for_tests(), engine, tracker);
        assert!(state.uptime_secs() < 1);
    }
}
