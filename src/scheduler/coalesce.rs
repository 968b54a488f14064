// src/scheduler/coalesce.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{CategoryConfig, ConfigFile};
use crate::errors::{Result, RosterError};
use crate::groups::GroupSource;
use crate::names::NameLookup;
use crate::refresh::collect_snapshot;
use crate::runner::{TaskRunner, TaskSpec};
use crate::scheduler::decision::{ArmDecision, Observation, decide, observe, reset_stuck};
use crate::state::{CategoryState, CategoryStateRepository, TaskStatus, deadline_after};
use crate::types::TaskId;

/// What [`CoalescingScheduler::request_update`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A new refresh task was armed.
    Armed { task_id: TaskId, delay: Duration },
    /// A pending refresh task was cancelled and replaced.
    Replaced {
        previous: TaskId,
        task_id: TaskId,
        delay: Duration,
    },
    /// Pending or retrying work already covers the request.
    Coalesced { status: TaskStatus },
}

impl RequestOutcome {
    /// Id of the task now responsible for the category, if this request
    /// armed one.
    pub fn armed_task(&self) -> Option<&str> {
        match self {
            RequestOutcome::Armed { task_id, .. } | RequestOutcome::Replaced { task_id, .. } => {
                Some(task_id)
            }
            RequestOutcome::Coalesced { .. } => None,
        }
    }
}

/// Decides when a category needs refreshing and arms at most one refresh
/// task per category.
///
/// All decisions are re-derived from the shared store on every call; the
/// scheduler keeps no per-category memory of its own.
pub struct CoalescingScheduler {
    config: Arc<ConfigFile>,
    repo: CategoryStateRepository,
    groups: GroupSource,
    names: Arc<dyn NameLookup>,
    runner: Arc<dyn TaskRunner>,
}

impl CoalescingScheduler {
    pub fn new(
        config: Arc<ConfigFile>,
        repo: CategoryStateRepository,
        groups: GroupSource,
        names: Arc<dyn NameLookup>,
        runner: Arc<dyn TaskRunner>,
    ) -> Self {
        Self {
            config,
            repo,
            groups,
            names,
            runner,
        }
    }

    /// True iff the content that would be rendered now differs from the
    /// last published content.
    pub async fn should_update(&self, category: &CategoryConfig) -> Result<bool> {
        let snapshot = collect_snapshot(&self.groups, self.names.as_ref(), category).await?;
        let remote = self.repo.remote_hash(&category.name).await?;
        debug!(
            category = %category.name,
            local = snapshot.fingerprint,
            remote,
            "compared fingerprints"
        );
        Ok(snapshot.fingerprint != remote)
    }

    /// Make sure a refresh of `category` will happen.
    ///
    /// - Nothing planned: arm a task after the debounce window (or at once
    ///   when `instant`).
    /// - Pending: fold into the armed task, or replace it when configured
    ///   to restart the window.
    /// - Executing: wait for the running refresh, then decide again.
    /// - Retrying: the runner's retry covers the request.
    /// - Deadline elapsed: cancel the abandoned task and start over.
    pub async fn request_update(
        &self,
        category: &CategoryConfig,
        instant: bool,
    ) -> Result<RequestOutcome> {
        let name = category.name.as_str();
        let state = self.settle(name).await?;

        match decide(&state, self.config.scheduler.pending_behaviour) {
            ArmDecision::Arm => {
                if state.status == TaskStatus::Pending {
                    warn!(category = name, "pending state without task id; re-arming");
                }
                let (task_id, delay) = self.arm(name, instant).await?;
                Ok(RequestOutcome::Armed { task_id, delay })
            }
            ArmDecision::Replace { previous } => {
                self.cancel_best_effort(name, &previous).await;
                let (task_id, delay) = self.arm(name, instant).await?;
                info!(category = name, previous = %previous, task_id = %task_id, "restarted pending refresh");
                Ok(RequestOutcome::Replaced {
                    previous,
                    task_id,
                    delay,
                })
            }
            ArmDecision::Coalesce { status } => {
                debug!(category = name, %status, "request folded into existing work");
                Ok(RequestOutcome::Coalesced { status })
            }
            ArmDecision::Timeout => Err(RosterError::CoordinationTimeout {
                category: name.to_string(),
                waited: self.config.scheduler.attempt_timeout(),
            }),
        }
    }

    /// Read the state until it is safe to decide: not executing, or stuck
    /// and reset, or the wait budget is spent.
    async fn settle(&self, name: &str) -> Result<CategoryState> {
        let timings = self.config.scheduler;
        let mut polls_left = max_polls(timings.attempt_timeout(), timings.poll_interval());

        loop {
            let mut state = self.repo.fetch(name).await?;

            match observe(&state, Utc::now()) {
                Observation::Stuck { stale_task } => {
                    warn!(
                        category = name,
                        status = %state.status,
                        task_id = ?stale_task,
                        "category state deadline elapsed; forcing reset"
                    );
                    if let Some(task_id) = stale_task {
                        self.cancel_best_effort(name, &task_id).await;
                        self.repo.set_task_id(name, None).await?;
                    }
                    self.repo.set_deadline(name, None).await?;
                    reset_stuck(&mut state);
                    return Ok(state);
                }
                Observation::Executing if polls_left > 0 => {
                    polls_left -= 1;
                    debug!(category = name, polls_left, "category executing; waiting");
                    tokio::time::sleep(timings.poll_interval()).await;
                }
                Observation::Executing | Observation::Settled => return Ok(state),
            }
        }
    }

    async fn arm(&self, name: &str, instant: bool) -> Result<(TaskId, Duration)> {
        let delay = if instant {
            Duration::ZERO
        } else {
            self.config.scheduler.pending_duration()
        };
        let task_id = Uuid::new_v4().to_string();

        self.repo.set_status(name, TaskStatus::Pending).await?;
        self.repo.set_task_id(name, Some(&task_id)).await?;
        self.repo
            .set_deadline(name, Some(deadline_after(Utc::now(), delay, 2)))
            .await?;

        self.runner
            .schedule(TaskSpec::update_category(name, task_id.clone(), delay))
            .await?;

        info!(category = name, task_id = %task_id, ?delay, "armed refresh task");
        Ok((task_id, delay))
    }

    async fn cancel_best_effort(&self, name: &str, task_id: &str) {
        if let Err(err) = self.runner.cancel(task_id).await {
            debug!(category = name, task_id, error = %err, "task cancellation failed; ignoring");
        }
    }
}

fn max_polls(timeout: Duration, interval: Duration) -> u32 {
    let polls = timeout.as_millis() / interval.as_millis().max(1);
    u32::try_from(polls).unwrap_or(u32::MAX).max(1)
}
