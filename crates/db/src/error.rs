use thiserror::Error;

/// §7 error taxonomy, the parts of it that originate in the database layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// TransientStore: database unreachable or a query timed out.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// InvalidPayload: a change-notification payload was not valid JSON or
    /// was missing a required field. §6's unrecognized-operation case is
    /// handled by `payload::parse` returning `Ok(None)` rather than an error
    /// here — there is no separate error variant for it.
    #[error("invalid change payload: {0}")]
    InvalidPayload(String),

    /// PersistFailure: the tracker's aggregate write did not complete within
    /// its deadline (§5: "a 5 s deadline per attempt").
    #[error("persisting aggregate for session {session_id} timed out")]
    PersistTimeout { session_id: i64 },
}

pub type DbResult<T> = Result<T, DbError>;
