// src/runner/mod.rs

//! Delayed task execution.
//!
//! The scheduler talks to a [`TaskRunner`] instead of spawning timers
//! itself, so tests can record what was scheduled and cancelled while
//! production uses [`LocalTaskRunner`].
//!
//! - [`local`] runs countdowns, retries and time limits inside this process.
//! - [`worker`] owns the refresh worker loop that executes attempts
//!   requested by the runner.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerSection;
use crate::errors::Result;
use crate::types::{BoxFuture, CategoryName, TaskId};

pub mod local;
pub mod worker;

pub use local::LocalTaskRunner;
pub use worker::spawn_refresh_worker;

/// Name of the only task kind the scheduler arms.
pub const UPDATE_CATEGORY_TASK: &str = "update_category";

/// A task to run once `countdown` has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: &'static str,
    pub task_id: TaskId,
    pub category: CategoryName,
    pub countdown: Duration,
}

impl TaskSpec {
    pub fn update_category(
        category: impl Into<CategoryName>,
        task_id: impl Into<TaskId>,
        countdown: Duration,
    ) -> Self {
        Self {
            name: UPDATE_CATEGORY_TASK,
            task_id: task_id.into(),
            category: category.into(),
            countdown,
        }
    }
}

/// Schedules tasks by id and cancels them by id.
///
/// Cancelling an unknown or finished task is a no-op.
pub trait TaskRunner: Send + Sync {
    fn schedule(&self, task: TaskSpec) -> BoxFuture<'_, Result<()>>;

    fn cancel<'a>(&'a self, task_id: &'a str) -> BoxFuture<'a, Result<()>>;
}

/// Time limits applied to every refresh attempt.
///
/// - `soft`: the attempt is asked to stop and records a retry.
/// - `hard`: the attempt is killed and counted as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskLimits {
    pub soft: Duration,
    pub hard: Duration,
    pub retry_interval: Duration,
}

impl From<&SchedulerSection> for TaskLimits {
    fn from(section: &SchedulerSection) -> Self {
        let soft = section.attempt_timeout();
        Self {
            soft,
            hard: soft.saturating_mul(2),
            retry_interval: section.retry_interval(),
        }
    }
}

/// One refresh attempt handed to the worker.
///
/// The worker answers on `reply` with the published fingerprint or the
/// attempt's error. Cancelling `abort` asks the attempt to give up;
/// cancelling `kill` makes the worker drop it without a reply.
#[derive(Debug)]
pub struct RefreshRequest {
    pub category: CategoryName,
    pub abort: CancellationToken,
    pub kill: CancellationToken,
    pub reply: oneshot::Sender<Result<u64>>,
}
