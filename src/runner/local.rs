// src/runner/local.rs

//! In-process task runner.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, mpsc, oneshot};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{Result, RosterError};
use crate::runner::{RefreshRequest, TaskLimits, TaskRunner, TaskSpec};
use crate::types::{BoxFuture, TaskId};

/// Runs scheduled refresh tasks as Tokio tasks of this process.
///
/// Every task waits out its countdown, then hands attempts to the refresh
/// worker until one succeeds or fails fatally:
///
/// - retryable failures are retried after `retry_interval`, without limit;
/// - past the soft limit the attempt is asked to abort (and records a
///   retry itself);
/// - past the hard limit the attempt is killed and counts as a failure.
///
/// Cancelling a task drops it before its countdown ends. An attempt that is
/// already executing is allowed to finish but is not retried.
pub struct LocalTaskRunner {
    worker: mpsc::Sender<RefreshRequest>,
    limits: TaskLimits,
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    active: Mutex<ActiveTasks>,
    idle: Notify,
}

/// Tasks counting down or running, keyed by task id.
///
/// `generation` tells a finishing instance apart from a newer one that
/// reused its id.
#[derive(Default)]
struct ActiveTasks {
    tasks: HashMap<TaskId, ActiveTask>,
    next_generation: u64,
}

struct ActiveTask {
    generation: u64,
    cancel: CancellationToken,
}

impl Shared {
    fn with_active<R>(&self, f: impl FnOnce(&mut ActiveTasks) -> R) -> R {
        match self.active.lock() {
            Ok(mut active) => f(&mut active),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn register(&self, task_id: &str, cancel: CancellationToken) -> (u64, Option<CancellationToken>) {
        self.with_active(|active| {
            let generation = active.next_generation;
            active.next_generation += 1;
            let previous = active
                .tasks
                .insert(task_id.to_string(), ActiveTask { generation, cancel })
                .map(|task| task.cancel);
            (generation, previous)
        })
    }

    fn finish(&self, task_id: &str, generation: u64) {
        let now_idle = self.with_active(|active| {
            if active
                .tasks
                .get(task_id)
                .is_some_and(|task| task.generation == generation)
            {
                active.tasks.remove(task_id);
            }
            active.tasks.is_empty()
        });
        if now_idle {
            self.idle.notify_waiters();
        }
    }
}

impl LocalTaskRunner {
    pub fn new(worker: mpsc::Sender<RefreshRequest>, limits: TaskLimits) -> Self {
        Self {
            worker,
            limits,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Ids of tasks that are counting down or running.
    pub fn active_tasks(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> =
            self.shared.with_active(|active| active.tasks.keys().cloned().collect());
        ids.sort();
        ids
    }

    /// Resolve once no task is counting down or running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.shared.with_active(|active| active.tasks.is_empty()) {
                return;
            }
            notified.await;
        }
    }
}

impl TaskRunner for LocalTaskRunner {
    fn schedule(&self, task: TaskSpec) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let cancel = CancellationToken::new();
            let (generation, replaced) = self.shared.register(&task.task_id, cancel.clone());
            if let Some(previous) = replaced {
                debug!(task_id = %task.task_id, "task id rescheduled; cancelling previous instance");
                previous.cancel();
            }

            debug!(
                task = task.name,
                task_id = %task.task_id,
                category = %task.category,
                countdown = ?task.countdown,
                "task scheduled"
            );

            let worker = self.worker.clone();
            let limits = self.limits;
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                let task_id = task.task_id.clone();
                run_task(task, cancel, worker, limits).await;
                shared.finish(&task_id, generation);
            });

            Ok(())
        })
    }

    fn cancel<'a>(&'a self, task_id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let token = self
                .shared
                .with_active(|active| active.tasks.get(task_id).map(|task| task.cancel.clone()));
            match token {
                Some(token) => {
                    debug!(task_id, "cancelling task");
                    token.cancel();
                }
                None => debug!(task_id, "cancel requested for unknown task; ignoring"),
            }
            Ok(())
        })
    }
}

enum Attempt {
    Finished(Result<u64>),
    WorkerGone,
}

async fn run_task(
    task: TaskSpec,
    cancel: CancellationToken,
    worker: mpsc::Sender<RefreshRequest>,
    limits: TaskLimits,
) {
    let category = task.category.as_str();
    let task_id = task.task_id.as_str();

    tokio::select! {
        _ = cancel.cancelled() => {
            debug!(category, task_id, "task cancelled before countdown elapsed");
            return;
        }
        _ = sleep(task.countdown) => {}
    }

    let mut attempt: u32 = 1;
    loop {
        debug!(category, task_id, attempt, "starting refresh attempt");

        let err = match run_attempt(category, &worker, limits).await {
            Attempt::Finished(Ok(fingerprint)) => {
                debug!(category, task_id, attempt, fingerprint, "task finished");
                return;
            }
            Attempt::Finished(Err(err)) => err,
            Attempt::WorkerGone => {
                error!(category, task_id, "refresh worker stopped; dropping task");
                return;
            }
        };

        if !err.is_retryable() {
            error!(category, task_id, error = %err, "task failed fatally; not retrying");
            return;
        }
        if cancel.is_cancelled() {
            info!(category, task_id, error = %err, "task cancelled during execution; not retrying");
            return;
        }

        warn!(
            category,
            task_id,
            attempt,
            error = %err,
            retry_in = ?limits.retry_interval,
            "task failed; scheduling retry"
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                info!(category, task_id, "task cancelled while waiting to retry");
                return;
            }
            _ = sleep(limits.retry_interval) => {}
        }
        attempt += 1;
    }
}

async fn run_attempt(
    category: &str,
    worker: &mpsc::Sender<RefreshRequest>,
    limits: TaskLimits,
) -> Attempt {
    let abort = CancellationToken::new();
    let kill = CancellationToken::new();
    let (reply_tx, mut reply_rx) = oneshot::channel();

    let request = RefreshRequest {
        category: category.to_string(),
        abort: abort.clone(),
        kill: kill.clone(),
        reply: reply_tx,
    };
    if worker.send(request).await.is_err() {
        return Attempt::WorkerGone;
    }

    match timeout(limits.soft, &mut reply_rx).await {
        Ok(Ok(result)) => return Attempt::Finished(result),
        Ok(Err(_)) => return Attempt::WorkerGone,
        Err(_) => {
            warn!(category, limit = ?limits.soft, "soft time limit reached; aborting attempt");
            abort.cancel();
        }
    }

    match timeout(limits.hard.saturating_sub(limits.soft), reply_rx).await {
        Ok(Ok(result)) => Attempt::Finished(result),
        Ok(Err(_)) => Attempt::WorkerGone,
        Err(_) => {
            error!(category, limit = ?limits.hard, "hard time limit reached; killing attempt");
            kill.cancel();
            Attempt::Finished(Err(RosterError::TimeLimitExceeded {
                category: category.to_string(),
                limit: limits.hard,
            }))
        }
    }
}
