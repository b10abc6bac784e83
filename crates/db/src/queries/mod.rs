//! Hand-written projection queries the loader (§4.3) and change handlers
//! (§4.5) run, one module per entity.

pub mod profiles;
pub mod rules;
pub mod sessions;
pub mod students;
