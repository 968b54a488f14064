// src/scheduler/mod.rs

//! Coalescing update scheduler.
//!
//! - [`decision`] holds the pure rules: how to read a state record and
//!   whether to arm, replace, coalesce or time out.
//! - [`coalesce`] is the IO shell that applies them against the shared
//!   store and the task runner.
//!
//! Per category the record moves through
//! `NOT_PLANNED -> PENDING -> EXECUTING -> (NOT_PLANNED | RETRY)`. Any
//! number of processes may call into the scheduler for the same category;
//! the deadline check and task-id cancellation keep at most one logically
//! active timer or execution per category.

pub mod coalesce;
pub mod decision;

pub use coalesce::{CoalescingScheduler, RequestOutcome};
pub use decision::{ArmDecision, Observation};
