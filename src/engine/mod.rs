// src/engine/mod.rs

//! Update engine for rosterboard.
//!
//! This module ties together:
//! - the "needs update?" check and the coalescing scheduler
//! - fan-out of change notifications to the categories that track a group
//! - the wiring of stores, collaborators and the local task runner
//!
//! The scheduling semantics live in [`crate::scheduler`]; [`update`] only
//! decides which categories to ask about, and [`wiring`] builds the object
//! graph used by `run` and by the tests.

pub mod update;
pub mod wiring;

pub use update::UpdateEngine;
pub use wiring::Services;
