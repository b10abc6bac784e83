//! The indexed cache engine (§4.1-§4.7): primary maps, derived indexes,
//! rebuild-on-notify semantics, time-filtered read paths, the profile
//! resolution algorithm, and stale-data cleanup.

pub mod cleaner;
pub mod error;
pub mod handlers;
pub mod indexes;
pub mod loader;
pub mod resolver;
pub mod store;
pub mod subscriber;

pub use cleaner::{Cleaner, CleanupReport};
pub use error::{CacheError, CacheResult};
pub use indexes::IndexSet;
pub use loader::Loader;
pub use resolver::{Resolution, Resolver};
pub use store::EntityStore;
pub use subscriber::Engine;
