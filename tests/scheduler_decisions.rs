// tests/scheduler_decisions.rs

use chrono::{Duration, Utc};
use rosterboard::scheduler::decision::{decide, observe, reset_stuck, ArmDecision, Observation};
use rosterboard::state::{CategoryState, TaskStatus};
use rosterboard::types::PendingBehaviour;

fn state(status: TaskStatus, task_id: Option<&str>, deadline_offset_secs: Option<i64>) -> CategoryState {
    CategoryState {
        status,
        task_id: task_id.map(str::to_string),
        deadline: deadline_offset_secs.map(|s| Utc::now() + Duration::seconds(s)),
        current_remote_hash: 0,
        message_id: None,
    }
}

#[test]
fn test_expired_deadline_is_stuck_in_any_status() {
    let now = Utc::now();
    for status in [TaskStatus::Pending, TaskStatus::Executing, TaskStatus::Retry] {
        let s = state(status, Some("t1"), Some(-5));
        assert_eq!(
            observe(&s, now),
            Observation::Stuck {
                stale_task: Some("t1".to_string())
            },
            "{status} with past deadline should be stuck"
        );
    }
}

#[test]
fn test_future_deadline_executing_waits() {
    let s = state(TaskStatus::Executing, Some("t1"), Some(60));
    assert_eq!(observe(&s, Utc::now()), Observation::Executing);
}

#[test]
fn test_settled_states() {
    let now = Utc::now();
    assert_eq!(observe(&CategoryState::default(), now), Observation::Settled);
    assert_eq!(
        observe(&state(TaskStatus::Pending, Some("t1"), Some(10)), now),
        Observation::Settled
    );
    assert_eq!(
        observe(&state(TaskStatus::Retry, None, Some(10)), now),
        Observation::Settled
    );
}

#[test]
fn test_reset_stuck_clears_task_and_deadline() {
    let mut s = state(TaskStatus::Executing, Some("t1"), Some(-1));
    reset_stuck(&mut s);
    assert_eq!(s.status, TaskStatus::NotPlanned);
    assert_eq!(s.task_id, None);
    assert_eq!(s.deadline, None);
    assert_eq!(decide(&s, PendingBehaviour::Coalesce), ArmDecision::Arm);
}

#[test]
fn test_decide_per_status() {
    let coalesce = PendingBehaviour::Coalesce;
    assert_eq!(decide(&CategoryState::default(), coalesce), ArmDecision::Arm);
    assert_eq!(
        decide(&state(TaskStatus::Executing, Some("t1"), Some(10)), coalesce),
        ArmDecision::Timeout
    );
    assert_eq!(
        decide(&state(TaskStatus::Retry, None, Some(10)), coalesce),
        ArmDecision::Coalesce {
            status: TaskStatus::Retry
        }
    );
    assert_eq!(
        decide(&state(TaskStatus::Pending, Some("t1"), Some(10)), coalesce),
        ArmDecision::Coalesce {
            status: TaskStatus::Pending
        }
    );
}

#[test]
fn test_restart_replaces_pending_task() {
    let s = state(TaskStatus::Pending, Some("t1"), Some(10));
    assert_eq!(
        decide(&s, PendingBehaviour::Restart),
        ArmDecision::Replace {
            previous: "t1".to_string()
        }
    );
    // Retry is covered by the runner regardless of behaviour.
    assert_eq!(
        decide(&state(TaskStatus::Retry, None, Some(10)), PendingBehaviour::Restart),
        ArmDecision::Coalesce {
            status: TaskStatus::Retry
        }
    );
}

#[test]
fn test_pending_without_task_id_rearms() {
    let s = state(TaskStatus::Pending, None, Some(10));
    assert_eq!(decide(&s, PendingBehaviour::Coalesce), ArmDecision::Arm);
    assert_eq!(decide(&s, PendingBehaviour::Restart), ArmDecision::Arm);
}
