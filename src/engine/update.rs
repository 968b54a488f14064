// src/engine/update.rs

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::bus::{Notification, NotificationHandler};
use crate::config::{CategoryConfig, ConfigFile};
use crate::errors::{Result, RosterError};
use crate::scheduler::CoalescingScheduler;
use crate::types::BoxFuture;

/// Turns "something may have changed" into scheduler requests.
pub struct UpdateEngine {
    config: Arc<ConfigFile>,
    scheduler: Arc<CoalescingScheduler>,
}

impl UpdateEngine {
    pub fn new(config: Arc<ConfigFile>, scheduler: Arc<CoalescingScheduler>) -> Self {
        Self { config, scheduler }
    }

    pub fn scheduler(&self) -> &CoalescingScheduler {
        &self.scheduler
    }

    /// Request a refresh of `category` if its content changed.
    ///
    /// Returns whether a refresh was requested.
    pub async fn update_if_needed(&self, category: &str, instant: bool) -> Result<bool> {
        let config = self
            .config
            .category(category)
            .ok_or_else(|| RosterError::UnknownCategory(category.to_string()))?;
        self.update_category(config, instant).await
    }

    async fn update_category(&self, category: &CategoryConfig, instant: bool) -> Result<bool> {
        if !self.scheduler.should_update(category).await? {
            debug!(category = %category.name, "content unchanged; no update needed");
            return Ok(false);
        }

        let outcome = self.scheduler.request_update(category, instant).await?;
        debug!(category = %category.name, ?outcome, "update requested");
        Ok(true)
    }

    /// Check every category concurrently. A failing category is logged and
    /// counted as unchanged.
    ///
    /// Returns how many categories had an update requested.
    pub async fn update_all_if_needed(&self, instant: bool) -> usize {
        self.update_many(self.config.categories().iter().collect(), instant)
            .await
    }

    async fn update_many(&self, categories: Vec<&CategoryConfig>, instant: bool) -> usize {
        let total = categories.len();
        let results = join_all(
            categories
                .iter()
                .map(|category| self.update_category(category, instant)),
        )
        .await;

        let mut changed = 0;
        for (category, result) in categories.iter().zip(results) {
            match result {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(err) => {
                    error!(category = %category.name, error = %err, "update check failed");
                }
            }
        }

        info!("{changed} of {total} categories changed");
        changed
    }

    /// React to one change notification.
    pub async fn on_notification(&self, notification: &Notification) -> Result<usize> {
        match notification {
            Notification::All => Ok(self.update_all_if_needed(false).await),
            Notification::Group(group) => {
                let categories: Vec<&CategoryConfig> =
                    self.config.categories_for_group(group).collect();
                if categories.is_empty() {
                    warn!(group = %group, "notification for untracked group; ignoring");
                    return Ok(0);
                }
                Ok(self.update_many(categories, false).await)
            }
        }
    }
}

impl NotificationHandler for UpdateEngine {
    fn handle(&self, notification: Notification) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.on_notification(&notification).await?;
            Ok(())
        })
    }
}
