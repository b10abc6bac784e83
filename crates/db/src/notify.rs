//! The dedicated change-subscriber connection (§4.4): LISTEN on the four
//! change channels, parse payloads, and transparently reconnect with capped
//! exponential backoff on disconnect (§5, §7 SubscriberLost).

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use sqlx::postgres::{PgListener, PgNotification};
use tracing::{debug, error, info, warn};

use crate::error::DbResult;
use crate::payload::{self, ChangeEvent};

pub const STUDENTS_CHANNEL: &str = "students_changes";
pub const PROFILES_CHANNEL: &str = "profiles_changes";
pub const RULES_CHANNEL: &str = "rules_changes";
pub const SESSIONS_CHANNEL: &str = "sessions_changes";

pub const ALL_CHANNELS: [&str; 4] =
    [STUDENTS_CHANNEL, PROFILES_CHANNEL, RULES_CHANNEL, SESSIONS_CHANNEL];

/// One parsed notification together with the channel it arrived on, so the
/// dispatch loop (§4.5) can route it to the right handler.
#[derive(Debug)]
pub struct Delivery {
    pub channel: String,
    pub event: ChangeEvent,
}

/// What `ChangeSubscriber::recv` yielded this call.
pub enum Next {
    Delivery(Delivery),
    /// The connection was lost and has been re-established. Callers must
    /// perform a full loader pass (§4.3 steps 2-5) to recover any events
    /// missed during the outage (§4.4: "on reconnect it performs a full
    /// loader pass").
    Reconnected,
}

/// Long-lived `LISTEN` connection, one per process (§5: "a dedicated,
/// long-lived connection subscribes to the channels").
pub struct ChangeSubscriber {
    listener: PgListener,
    database_url: String,
}

impl ChangeSubscriber {
    pub async fn connect(database_url: &str) -> DbResult<Self> {
        let listener = Self::dial(database_url).await?;
        Ok(Self { listener, database_url: database_url.to_string() })
    }

    async fn dial(database_url: &str) -> DbResult<PgListener> {
        let mut listener = PgListener::connect(database_url).await?;
        listener.listen_all(ALL_CHANNELS).await?;
        Ok(listener)
    }

    /// Block for the next delivery. Notifications with unrecognized
    /// operations or unparseable payloads are logged and dropped (§6, §7
    /// InvalidPayload) without surfacing an error to the caller; a dropped
    /// connection is retried with backoff and reported as `Next::Reconnected`.
    pub async fn recv(&mut self) -> DbResult<Next> {
        loop {
            match self.listener.recv().await {
                Ok(notification) => {
                    if let Some(delivery) = self.parse(notification) {
                        return Ok(Next::Delivery(delivery));
                    }
                }
                Err(err) => {
                    warn!(error = %err, "change subscriber connection lost, reconnecting");
                    self.reconnect().await?;
                    return Ok(Next::Reconnected);
                }
            }
        }
    }

    fn parse(&self, notification: PgNotification) -> Option<Delivery> {
        let channel = notification.channel().to_string();
        match payload::parse(notification.payload()) {
            Ok(Some(event)) => Some(Delivery { channel, event }),
            Ok(None) => {
                debug!(channel = %channel, "dropping notification with unrecognized operation");
                None
            }
            Err(err) => {
                error!(channel = %channel, error = %err, "dropping invalid change payload");
                None
            }
        }
    }

    async fn reconnect(&mut self) -> DbResult<()> {
        let database_url = self.database_url.clone();
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(60))
            .with_factor(2.0)
            .without_max_times();

        let listener = (|| async { Self::dial(&database_url).await })
            .retry(backoff)
            .notify(|err, delay| {
                warn!(error = %err, delay = ?delay, "reconnect attempt failed, retrying");
            })
            .await?;

        self.listener = listener;
        metrics::counter!("warden_subscriber_reconnects_total").increment(1);
        info!("change subscriber reconnected");
        Ok(())
    }
}
