use thiserror::Error;

/// §7 error taxonomy, the parts of it that originate in the tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Cache(#[from] warden_cache::CacheError),

    #[error(transparent)]
    Db(#[from] warden_db::DbError),

    /// A read (`sessionTracking`, `teacherTracking`) against a context the
    /// registry has never created a tracker for.
    #[error("no tracker for session {id}")]
    UnknownSession { id: i64 },
}

pub type TrackerResult<T> = Result<T, TrackerError>;
