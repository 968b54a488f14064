// tests/local_runner.rs

mod common;

use std::time::Duration;

use rosterboard::runner::{
    spawn_refresh_worker, LocalTaskRunner, RefreshRequest, TaskLimits, TaskRunner, TaskSpec,
};
use rosterboard::config::SchedulerSection;
use rosterboard::state::TaskStatus;
use rosterboard_test_utils::builders::{CategoryBuilder, ConfigFileBuilder};
use rosterboard_test_utils::fakes::FakeNames;
use rosterboard_test_utils::init_tracing;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tokio::time::Instant;

use common::Harness;

async fn harness() -> Harness {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_attempt_timeout_secs(5)
        .with_retry_interval_secs(2)
        .with_category(CategoryBuilder::new("staff").group("g1"))
        .build();
    let h = Harness::with_names(cfg, FakeNames::new().with("p1", "Alice"));
    h.put_group("g1", "Admins", &["p1"]).await;
    h
}

#[tokio::test(start_paused = true)]
async fn test_task_runs_after_countdown() {
    let h = harness().await;
    let runner = &h.services.runner;
    let started = Instant::now();

    runner
        .schedule(TaskSpec::update_category("staff", "t1", Duration::from_secs(5)))
        .await
        .unwrap();
    assert_eq!(runner.active_tasks(), vec!["t1".to_string()]);

    runner.wait_idle().await;

    assert!(started.elapsed() >= Duration::from_secs(5));
    assert_eq!(h.publisher.publish_count(), 1);
    assert!(runner.active_tasks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_countdown_drops_task() {
    let h = harness().await;
    let runner = &h.services.runner;

    runner
        .schedule(TaskSpec::update_category("staff", "t1", Duration::from_secs(5)))
        .await
        .unwrap();
    runner.cancel("t1").await.unwrap();
    runner.wait_idle().await;

    assert_eq!(h.publisher.publish_count(), 0);
}

#[tokio::test]
async fn test_cancel_unknown_task_is_noop() {
    let h = harness().await;
    h.services.runner.cancel("never-scheduled").await.unwrap();
    h.services.runner.cancel("never-scheduled").await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failures_retry_at_fixed_interval() {
    let h = harness().await;
    let runner = &h.services.runner;
    h.publisher.fail_next(2);
    let started = Instant::now();

    runner
        .schedule(TaskSpec::update_category("staff", "t1", Duration::ZERO))
        .await
        .unwrap();
    runner.wait_idle().await;

    assert!(started.elapsed() >= Duration::from_secs(4));
    assert_eq!(h.publisher.publish_count(), 1);
    assert_eq!(h.state("staff").await.status, TaskStatus::NotPlanned);
}

#[tokio::test(start_paused = true)]
async fn test_fatal_failure_is_not_retried() {
    let h = harness().await;
    let runner = &h.services.runner;

    runner
        .schedule(TaskSpec::update_category("ghost", "t1", Duration::ZERO))
        .await
        .unwrap();
    runner.wait_idle().await;

    assert_eq!(h.publisher.publish_count(), 0);
    assert_eq!(h.state("ghost").await.status, TaskStatus::NotPlanned);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_while_waiting_to_retry_stops_task() {
    let h = harness().await;
    let runner = &h.services.runner;
    h.publisher.fail_next(100);

    runner
        .schedule(TaskSpec::update_category("staff", "t1", Duration::ZERO))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    runner.cancel("t1").await.unwrap();
    runner.wait_idle().await;

    assert_eq!(h.publisher.publish_count(), 0);
    assert_eq!(h.state("staff").await.status, TaskStatus::Retry);
}

#[tokio::test(start_paused = true)]
async fn test_soft_limit_aborts_attempt_and_retries() {
    let h = harness().await;
    let runner = &h.services.runner;
    h.publisher.set_delay(Some(Duration::from_secs(60)));

    {
        let publisher = h.publisher.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(6)).await;
            publisher.set_delay(None);
        });
    }

    let started = Instant::now();
    runner
        .schedule(TaskSpec::update_category("staff", "t1", Duration::ZERO))
        .await
        .unwrap();
    runner.wait_idle().await;

    // Aborted at the 5 s soft limit, retried 2 s later.
    assert!(started.elapsed() >= Duration::from_secs(7));
    assert_eq!(h.publisher.publish_count(), 1);
    assert_eq!(h.state("staff").await.status, TaskStatus::NotPlanned);
}

#[tokio::test(start_paused = true)]
async fn test_hard_limit_kills_unresponsive_attempt() {
    init_tracing();
    let (tx, mut rx) = mpsc::channel::<RefreshRequest>(8);
    let runner = LocalTaskRunner::new(
        tx,
        TaskLimits {
            soft: Duration::from_secs(5),
            hard: Duration::from_secs(10),
            retry_interval: Duration::from_secs(2),
        },
    );

    runner
        .schedule(TaskSpec::update_category("staff", "t1", Duration::ZERO))
        .await
        .unwrap();

    // A worker that never answers, but notices the abort.
    let first = rx.recv().await.unwrap();
    let started = Instant::now();
    first.abort.cancelled().await;
    assert!(started.elapsed() >= Duration::from_secs(5));

    // After the hard limit the runner kills the attempt and retries.
    assert!(!first.kill.is_cancelled());
    let second = rx.recv().await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(12));
    assert!(first.kill.is_cancelled());
    assert_eq!(second.category, "staff");
    assert!(!second.kill.is_cancelled());

    runner.cancel("t1").await.unwrap();
    drop(first);
    drop(second);
    runner.wait_idle().await;
    assert!(runner.active_tasks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_killed_attempt_is_dropped_without_reply() {
    let h = harness().await;
    h.publisher.set_delay(Some(Duration::from_secs(600)));
    let worker = spawn_refresh_worker(h.services.executor.clone());

    let kill = CancellationToken::new();
    let (reply_tx, reply_rx) = oneshot::channel();
    worker
        .send(RefreshRequest {
            category: "staff".to_string(),
            abort: CancellationToken::new(),
            kill: kill.clone(),
            reply: reply_tx,
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.state("staff").await.status, TaskStatus::Executing);

    kill.cancel();
    assert!(reply_rx.await.is_err());

    // Nothing is published once the attempt is gone.
    tokio::time::sleep(Duration::from_secs(700)).await;
    assert_eq!(h.publisher.publish_count(), 0);
}

#[test]
fn test_limits_derive_from_scheduler_section() {
    let section = SchedulerSection {
        attempt_timeout_secs: 30,
        retry_interval_secs: 10,
        ..SchedulerSection::default()
    };
    let limits = TaskLimits::from(&section);
    assert_eq!(limits.soft, Duration::from_secs(30));
    assert_eq!(limits.hard, Duration::from_secs(60));
    assert_eq!(limits.retry_interval, Duration::from_secs(10));

    let section = SchedulerSection {
        attempt_timeout_secs: u64::MAX,
        ..SchedulerSection::default()
    };
    assert_eq!(TaskLimits::from(&section).hard, Duration::MAX);
}
