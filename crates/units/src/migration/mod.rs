//! Moving saved unit data onto the capacity chosen for this session.
//!
//! The host calls three hooks per load, in order: before it deserialises
//! the unit array, after it has, and once the level is running. The
//! [`MigrationEngine`] carries state between them.

mod context;
mod engine;


pub use context::*;
pub use engine::{MigrationEngine, MigrationState};
