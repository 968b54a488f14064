// src/scheduler/decision.rs

//! Pure decision rules of the coalescing scheduler.
//!
//! These functions look at a freshly fetched [`CategoryState`] and say what
//! the IO shell in [`super::coalesce`] should do next. They perform no IO
//! and are tested without a store or a runner.

use chrono::{DateTime, Utc};

use crate::state::{CategoryState, TaskStatus};
use crate::types::{PendingBehaviour, TaskId};

/// What a state read means for a request that is waiting to decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The deadline passed: the recorded work is presumed abandoned.
    Stuck { stale_task: Option<TaskId> },
    /// Another process is refreshing right now; read again later.
    Executing,
    /// Safe to decide now.
    Settled,
}

pub fn observe(state: &CategoryState, now: DateTime<Utc>) -> Observation {
    if state.is_stuck(now) {
        return Observation::Stuck {
            stale_task: state.task_id.clone(),
        };
    }
    if state.status == TaskStatus::Executing {
        return Observation::Executing;
    }
    Observation::Settled
}

/// Apply the forced reset of a stuck record to the local view.
///
/// `NotPlanned` is deliberately not persisted by the caller: arming a new
/// timer persists `Pending` right after.
pub fn reset_stuck(state: &mut CategoryState) {
    state.task_id = None;
    state.deadline = None;
    state.status = TaskStatus::NotPlanned;
}

/// Final decision once the state has settled (or waiting gave up).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmDecision {
    /// Nothing is planned; arm a new timer.
    Arm,
    /// Cancel the pending timer `previous` and arm a new one.
    Replace { previous: TaskId },
    /// Existing pending or retrying work already covers the request.
    Coalesce { status: TaskStatus },
    /// Still executing after the wait budget was spent.
    Timeout,
}

pub fn decide(state: &CategoryState, behaviour: PendingBehaviour) -> ArmDecision {
    match state.status {
        TaskStatus::NotPlanned => ArmDecision::Arm,
        TaskStatus::Executing => ArmDecision::Timeout,
        TaskStatus::Retry => ArmDecision::Coalesce {
            status: TaskStatus::Retry,
        },
        TaskStatus::Pending => match (&state.task_id, behaviour) {
            // Pending without a task id breaks the record invariant; nothing
            // will ever fire, so arm afresh.
            (None, _) => ArmDecision::Arm,
            (Some(_), PendingBehaviour::Coalesce) => ArmDecision::Coalesce {
                status: TaskStatus::Pending,
            },
            (Some(previous), PendingBehaviour::Restart) => ArmDecision::Replace {
                previous: previous.clone(),
            },
        },
    }
}
