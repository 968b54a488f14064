// src/state/mod.rs

//! Durable per-category scheduling state.
//!
//! One [`CategoryState`] record exists per configured category. It is owned
//! by the shared store; everything in this crate only ever holds a transient
//! copy fetched for the current operation, because any process may change
//! the record between two awaits.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TaskId;

pub mod repository;

pub use repository::CategoryStateRepository;

/// Scheduling status of a category.
///
/// ```text
/// NOT_PLANNED -> PENDING -> EXECUTING -> NOT_PLANNED
///                               |  ^
///                               v  |
///                              RETRY
/// ```
///
/// Any status whose deadline has passed may be forced back to
/// `NotPlanned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// No refresh is planned.
    #[default]
    NotPlanned,
    /// A refresh is armed and waiting for its countdown.
    Pending,
    /// A worker is refreshing the destination right now.
    Executing,
    /// The last attempt failed; the task runner will try again.
    Retry,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotPlanned => "not_planned",
            TaskStatus::Pending => "pending",
            TaskStatus::Executing => "executing",
            TaskStatus::Retry => "retry",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields of the persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    Status,
    TaskId,
    Deadline,
    CurrentRemoteHash,
    MessageId,
}

impl StateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateField::Status => "status",
            StateField::TaskId => "task_id",
            StateField::Deadline => "deadline",
            StateField::CurrentRemoteHash => "current_remote_hash",
            StateField::MessageId => "message_id",
        }
    }
}

/// Scheduling record of one category.
///
/// Invariants (re-established by readers, not by the store):
/// - `task_id` is set iff `status` is `Pending` or `Executing`;
/// - `deadline` is set iff `status` is `Executing` or `Retry` (or a
///   just-armed `Pending`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryState {
    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub task_id: Option<TaskId>,

    /// Past this instant the record is presumed abandoned.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub deadline: Option<DateTime<Utc>>,

    /// Fingerprint of the last published content; 0 means never published.
    #[serde(default)]
    pub current_remote_hash: u64,

    /// Destination message created by a previous publish, if any.
    #[serde(default)]
    pub message_id: Option<u64>,
}

impl CategoryState {
    /// True if a deadline is recorded and has elapsed at `now`.
    pub fn is_stuck(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| deadline < now)
    }
}

/// Deadline granting `factor` times `span` from `now`.
///
/// Saturates at the latest representable instant instead of overflowing.
pub fn deadline_after(now: DateTime<Utc>, span: Duration, factor: u32) -> DateTime<Utc> {
    span.checked_mul(factor)
        .and_then(|total| chrono::Duration::from_std(total).ok())
        .and_then(|total| now.checked_add_signed(total))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
