use thiserror::Error;

/// §7 error taxonomy, the parts of it that originate in the cache engine.
///
/// §4.5's tie breaks (an UPDATE/DELETE referencing an id the cache has never
/// seen, a RELOAD arriving for an absent id) and §7's IntegrityConflict (the
/// store's per-key index mutations are lock-held atomic, see `indexes.rs`)
/// are both handled in place by the handlers rather than surfaced here —
/// there is nothing left for this enum to carry but the database layer's
/// own errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Db(#[from] warden_db::DbError),
}

pub type CacheResult<T> = Result<T, CacheError>;
