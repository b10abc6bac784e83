use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::info;

use crate::error::DbResult;

/// Database handle wrapping a Postgres connection pool.
///
/// Cloning is cheap (`PgPool` is itself a handle around a shared connection
/// pool) — every component that needs database access gets its own `Database`
/// clone rather than passing references around (matches the teacher's
/// `Database` being `#[derive(Clone)]`).
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect using a `postgres://...` connection string. `max_connections`
    /// should be sized for (loader + handlers + resolver reads + tracker
    /// writes); the loader and subscriber each hold at most one connection
    /// busy at a time, so a small pool is enough.
    pub async fn connect(database_url: &str, max_connections: u32) -> DbResult<Self> {
        let options: PgConnectOptions = database_url.parse()?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        info!(max_connections, "connected to database");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// A pool that never actually dials Postgres until its first query
    /// (`connect_lazy`) — used by other crates' `#[cfg(test)]` fixtures that
    /// need a `Database` value to construct an `Engine`/`AppState` but never
    /// issue a query against it, matching §10.4: "no live Postgres in unit
    /// tests."
    #[cfg(any(test, feature = "test-util"))]
    pub fn new_lazy_for_tests() -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgres://localhost/warden_test")
            .expect("lazy pool construction never dials the database");
        Self { pool }
    }

    /// Backing query for `GET /health` (§7: "Only the `/health` contract
    /// surfaces database reachability").
    pub async fn is_reachable(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
