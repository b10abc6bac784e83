//! Database layer: connection pool, change-notification subscriber, and the
//! hand-written projection queries the loader and change handlers run (§6).
//!
//! Everything here speaks in `warden-core` domain types on the way out —
//! callers never see a raw row shape.

pub mod error;
pub mod notify;
pub mod payload;
pub mod pool;
pub mod queries;
mod rows;
pub mod write;

pub use error::{DbError, DbResult};
pub use payload::{ChangeEvent, Operation};
pub use pool::Database;
