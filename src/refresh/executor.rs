// src/refresh/executor.rs

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{CategoryConfig, ConfigFile};
use crate::errors::{Result, RosterError};
use crate::groups::GroupSource;
use crate::names::NameLookup;
use crate::refresh::collect_snapshot;
use crate::render::{Destination, Publisher, render_category};
use crate::state::{CategoryStateRepository, StateField, TaskStatus, deadline_after};

/// Performs one refresh attempt of a category.
///
/// An attempt is idempotent: fetch, render, publish, then record the new
/// fingerprint. Failures leave the record in `Retry` so stuck detection and
/// the task runner's retry policy can take over.
pub struct RefreshExecutor {
    config: Arc<ConfigFile>,
    repo: CategoryStateRepository,
    groups: GroupSource,
    names: Arc<dyn NameLookup>,
    publisher: Arc<dyn Publisher>,
}

impl RefreshExecutor {
    pub fn new(
        config: Arc<ConfigFile>,
        repo: CategoryStateRepository,
        groups: GroupSource,
        names: Arc<dyn NameLookup>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            config,
            repo,
            groups,
            names,
            publisher,
        }
    }

    /// Refresh `category` and return the fingerprint now published.
    pub async fn run(&self, category: &str) -> Result<u64> {
        self.run_until(category, &CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), but gives up with
    /// [`RosterError::TimeLimitExceeded`] once `abort` fires. The failure is
    /// recorded as a retry like any other.
    pub async fn run_until(&self, category: &str, abort: &CancellationToken) -> Result<u64> {
        let timings = self.config.scheduler;
        let now = Utc::now();

        self.repo
            .set_deadline(category, Some(deadline_after(now, timings.attempt_timeout(), 2)))
            .await?;
        self.repo.set_status(category, TaskStatus::Executing).await?;

        let Some(config) = self.config.category(category) else {
            error!(category, "no configuration for category; not retrying");
            self.reset_state(category).await;
            return Err(RosterError::UnknownCategory(category.to_string()));
        };

        info!(category, "refreshing category");
        let result = tokio::select! {
            result = self.refresh(config) => result,
            _ = abort.cancelled() => Err(RosterError::TimeLimitExceeded {
                category: category.to_string(),
                limit: timings.attempt_timeout(),
            }),
        };

        match result {
            Ok(fingerprint) => {
                info!(category, fingerprint, "category refreshed");
                Ok(fingerprint)
            }
            Err(err) => {
                warn!(category, error = %err, "refresh failed; recording retry state");
                self.record_retry(category).await;
                Err(err)
            }
        }
    }

    async fn refresh(&self, category: &CategoryConfig) -> Result<u64> {
        let name = category.name.as_str();
        let snapshot = collect_snapshot(&self.groups, self.names.as_ref(), category).await?;

        let message = render_category(category, &snapshot.groups, &snapshot.names, Utc::now());

        let stored_message_id: Option<u64> = self
            .repo
            .fetch_field(name, StateField::MessageId, None)
            .await?;
        let destination = Destination {
            channel_id: category.channel_id,
            message_id: stored_message_id.or(category.message_id),
        };

        let receipt = self.publisher.publish(destination, &message).await?;
        if Some(receipt.message_id) != stored_message_id {
            self.repo
                .set_message_id(name, Some(receipt.message_id))
                .await?;
        }

        self.repo.set_remote_hash(name, snapshot.fingerprint).await?;
        self.repo.set_deadline(name, None).await?;
        self.repo.set_status(name, TaskStatus::NotPlanned).await?;
        self.repo.set_task_id(name, None).await?;

        Ok(snapshot.fingerprint)
    }

    async fn record_retry(&self, category: &str) {
        let retry_deadline = deadline_after(Utc::now(), self.config.scheduler.retry_interval(), 2);
        let result = async {
            self.repo.set_deadline(category, Some(retry_deadline)).await?;
            self.repo.set_status(category, TaskStatus::Retry).await
        }
        .await;

        if let Err(err) = result {
            error!(category, error = %err, "failed to record retry state");
        }
    }

    async fn reset_state(&self, category: &str) {
        let result = async {
            self.repo.set_deadline(category, None).await?;
            self.repo.set_status(category, TaskStatus::NotPlanned).await?;
            self.repo.set_task_id(category, None).await
        }
        .await;

        if let Err(err) = result {
            error!(category, error = %err, "failed to reset category state");
        }
    }
}
