//! C4: the change subscriber's dispatch loop, built on
//! `warden_db::notify::ChangeSubscriber`. Routes each delivery to the
//! matching C5 handler and, on reconnect, replays the loader's steps 2-5
//! (§4.4).
//!
//! Ordering (§5): "changes for distinct entity ids may be processed
//! concurrently, but changes for the **same id** must be processed in
//! arrival order." This implementation runs one sequential delivery loop —
//! the simplest of the spec's sanctioned strategies ("a single-threaded
//! handler per channel"), trivially satisfying the per-id ordering
//! requirement at the cost of cross-id parallelism, which the expected
//! notification volume doesn't need.

use chrono::Utc;
use tracing::{error, info};
use warden_db::notify::{ChangeSubscriber, Next, PROFILES_CHANNEL, RULES_CHANNEL, SESSIONS_CHANNEL, STUDENTS_CHANNEL};
use warden_db::Database;

use crate::handlers;
use crate::indexes::IndexSet;
use crate::loader::Loader;
use crate::store::EntityStore;

pub struct Engine {
    pub store: EntityStore,
    pub indexes: IndexSet,
    db: Database,
    loader: Loader,
}

impl Engine {
    pub fn new(db: Database, forward_window_days: u64) -> Self {
        let store = EntityStore::new();
        let indexes = IndexSet::new();
        let loader = Loader::new(db.clone(), forward_window_days);
        Self { store, indexes, db, loader }
    }

    /// §4.3 steps 1-5: populate the store and build indexes. Call before
    /// `run_subscriber` and before serving any reads.
    pub async fn load_initial(&self) -> crate::error::CacheResult<()> {
        self.loader.load_all(&self.store, &self.indexes, Utc::now()).await
    }

    /// §4.3 step 6 onward: run the subscriber's dispatch loop forever.
    /// Intended to be spawned as its own task; returns only on an
    /// unrecoverable database error from a handler re-fetch.
    pub async fn run_subscriber(&self, mut subscriber: ChangeSubscriber) {
        loop {
            match subscriber.recv().await {
                Ok(Next::Delivery(delivery)) => {
                    if let Err(err) = self.dispatch(&delivery.channel, &delivery.event).await {
                        error!(channel = %delivery.channel, error = %err, "change handler failed");
                    }
                }
                Ok(Next::Reconnected) => {
                    info!("subscriber reconnected, replaying loader steps 2-5");
                    if let Err(err) = self.loader.reload_from_step_2(&self.store, &self.indexes, Utc::now()).await {
                        error!(error = %err, "reload after reconnect failed");
                    }
                }
                Err(err) => {
                    error!(error = %err, "change subscriber terminated");
                    return;
                }
            }
        }
    }

    async fn dispatch(&self, channel: &str, event: &warden_db::ChangeEvent) -> crate::error::CacheResult<()> {
        let now = Utc::now();
        let entity = match channel {
            STUDENTS_CHANNEL => "student",
            PROFILES_CHANNEL => "profile",
            RULES_CHANNEL => "rule",
            SESSIONS_CHANNEL => "session",
            _ => "unknown",
        };
        metrics::counter!("warden_handler_dispatch_total", "entity" => entity, "operation" => event.operation.as_label())
            .increment(1);

        match channel {
            STUDENTS_CHANNEL => handlers::handle_student_change(&self.store, &self.indexes, &self.db, event).await,
            PROFILES_CHANNEL => handlers::handle_profile_change(&self.store, &self.db, event).await,
            RULES_CHANNEL => {
                handlers::handle_rule_change(&self.store, &self.indexes, &self.db, event, self.loader_window_days(), now)
                    .await
            }
            SESSIONS_CHANNEL => {
                handlers::handle_session_change(
                    &self.store,
                    &self.indexes,
                    &self.db,
                    event,
                    self.loader_window_days(),
                    now,
                )
                .await
            }
            other => {
                error!(channel = %other, "notification on unrecognized channel, dropping");
                Ok(())
            }
        }
    }

    fn loader_window_days(&self) -> u64 {
        self.loader.forward_window_days()
    }
}
