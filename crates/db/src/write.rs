//! The tracker's single write path (§6 write contract, §4.9 aggregate
//! persistence): exactly two columns, `sessions.is_active` and
//! `sessions.percentage`, keyed by `sessions.id`. No other table is written
//! by this process.

use std::time::Duration;

use sqlx::PgPool;
use tokio::time::timeout;

use crate::error::{DbError, DbResult};

/// Bounded by a 5 s deadline per attempt (§5). A timed-out attempt is
/// reported as `DbError::PersistTimeout`; the caller (§4.9, §7 PersistFailure)
/// logs it and evicts the tracker regardless of outcome.
pub async fn write_session_aggregate(
    pool: &PgPool,
    session_id: i64,
    is_active: bool,
    percentage: f64,
) -> DbResult<()> {
    let query = sqlx::query("UPDATE sessions SET is_active = $2, percentage = $3 WHERE id = $1")
        .bind(session_id)
        .bind(is_active)
        .bind(percentage)
        .execute(pool);

    match timeout(Duration::from_secs(5), query).await {
        Ok(result) => {
            result?;
            Ok(())
        }
        Err(_) => Err(DbError::PersistTimeout { session_id }),
    }
}

#[cfg(test)]
mod tests {
    // A live Postgres instance is required to exercise this write path, and
    // none is available in this environment. Unit coverage for the
    // aggregate math itself lives in `warden-tracker`.
}
