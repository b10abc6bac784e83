//! Background scheduled duties (§4.9, §4.10, §6): tracker rotation (1 min
//! fixed), ended-session aggregate persistence (5 min), stale rule-tracker
//! sweep (10 min), and the cleaner (default 6 h, first run delayed 1 h
//! after startup) — each its own `tokio::spawn`'d `interval.tick()` loop,
//! matching the teacher's `spawn_reconciliation_loop`/`spawn_cleanup_task`
//! shape in `live/manager.rs`.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::interval;
use tracing::info;

use crate::config::{RULE_TRACKER_SWEEP_INTERVAL, SESSION_PERSISTENCE_INTERVAL, TRACKER_ROTATION_INTERVAL};
use crate::metrics;
use crate::state::AppState;

/// Every minute: rotate every session and rule-context tracker (§4.9
/// scheduled duties, first bullet).
pub fn spawn_rotation_loop(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut tick = interval(TRACKER_ROTATION_INTERVAL);
        loop {
            tick.tick().await;
            state.tracker.rotate_all();
        }
    });
}

/// Every 5 minutes: persist and evict ended session trackers (§4.9).
pub fn spawn_session_persistence_loop(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut tick = interval(SESSION_PERSISTENCE_INTERVAL);
        loop {
            tick.tick().await;
            let persisted =
                warden_tracker::persist_ended_sessions(&state.tracker, &state.db, Utc::now(), state.config.activity_threshold)
                    .await;
            if persisted > 0 {
                info!(persisted, "session aggregate persistence pass complete");
            }
        }
    });
}

/// Every 10 minutes: evict rule-context trackers idle past the staleness
/// threshold (§4.9, §4.10 `Active -> Stale`).
pub fn spawn_rule_tracker_sweep_loop(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut tick = interval(RULE_TRACKER_SWEEP_INTERVAL);
        loop {
            tick.tick().await;
            let removed = state.tracker.remove_stale_rule_trackers(Utc::now());
            if removed > 0 {
                info!(removed, "stale rule-tracker sweep complete");
            }
        }
    });
}

/// Cleanup interval + startup delay per `Config` (§4.7, §6).
pub fn spawn_cleanup_loop(state: Arc<AppState>) {
    tokio::spawn(async move {
        tokio::time::sleep(state.config.startup_cleanup_delay()).await;
        let mut tick = interval(state.config.cleanup_interval());
        loop {
            tick.tick().await;
            let report = state.cleaner().run(Utc::now());
            metrics::record_cleanup(report.sessions_removed, report.rules_removed);
            info!(sessions_removed = report.sessions_removed, rules_removed = report.rules_removed, "scheduled cleanup complete");
        }
    });
}

/// Change-subscriber dispatch loop: LISTEN forever, reconnecting with
/// backoff and reloading on reconnect (§4.4, §5 SubscriberLost).
pub fn spawn_subscriber_loop(state: Arc<AppState>, subscriber: warden_db::notify::ChangeSubscriber) {
    tokio::spawn(async move {
        state.engine.run_subscriber(subscriber).await;
    });
}
