// src/bus/mod.rs

//! Change notification bus.
//!
//! Group producers publish a group id on the updates channel whenever that
//! group changes, or [`WILDCARD`] to mark every category dirty. Each process
//! runs one listener ([`ChangeBus::listen`]) that hands notifications to a
//! [`NotificationHandler`], and announces once at startup which groups it
//! cares about ([`ChangeBus::publish_tracked_groups`]).

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::store::{KeySpace, StateStore};
use crate::types::BoxFuture;

pub mod backoff;

pub use backoff::Backoff;

/// Payload meaning "every category is dirty".
pub const WILDCARD: &str = "*";

/// A parsed message from the updates channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Group(String),
    All,
}

impl Notification {
    /// Parse a channel payload. Blank payloads carry no information.
    pub fn parse(payload: &str) -> Option<Self> {
        match payload.trim() {
            "" => None,
            WILDCARD => Some(Notification::All),
            group => Some(Notification::Group(group.to_string())),
        }
    }

    pub fn as_payload(&self) -> &str {
        match self {
            Notification::Group(group) => group,
            Notification::All => WILDCARD,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_payload())
    }
}

/// Receives notifications from [`ChangeBus::listen`].
pub trait NotificationHandler: Send + Sync {
    fn handle(&self, notification: Notification) -> BoxFuture<'_, Result<()>>;
}

/// Publishes and listens on the shared updates channel.
#[derive(Clone)]
pub struct ChangeBus {
    store: Arc<dyn StateStore>,
    keys: KeySpace,
    backoff: Backoff,
}

impl ChangeBus {
    pub fn new(store: Arc<dyn StateStore>, keys: KeySpace) -> Self {
        Self {
            store,
            keys,
            backoff: Backoff::default(),
        }
    }

    /// Override the reconnect backoff.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Store the set of tracked group ids as a JSON array so producers know
    /// what to publish.
    pub async fn publish_tracked_groups(&self, groups: &BTreeSet<String>) -> Result<()> {
        let raw = serde_json::to_string(groups)?;
        self.store.set(&self.keys.tracked_groups(), &raw).await?;
        info!(count = groups.len(), "announced tracked groups");
        Ok(())
    }

    pub async fn notify(&self, notification: &Notification) -> Result<()> {
        debug!(%notification, "publishing change notification");
        self.store
            .publish(&self.keys.updates_channel(), notification.as_payload())
            .await
    }

    /// Listen until `shutdown` fires.
    ///
    /// Every message is handled in its own Tokio task; handler errors are
    /// logged and never end the subscription. Lost or failed subscriptions
    /// are retried with exponential backoff.
    pub async fn listen(
        &self,
        handler: Arc<dyn NotificationHandler>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let channel = self.keys.updates_channel();
        let mut backoff = self.backoff;

        while !shutdown.is_cancelled() {
            match self.store.subscribe(&channel).await {
                Ok(mut messages) => {
                    info!(channel = %channel, "listening for change notifications");
                    backoff.reset();

                    loop {
                        let payload = tokio::select! {
                            _ = shutdown.cancelled() => return Ok(()),
                            next = messages.next() => next,
                        };
                        let Some(payload) = payload else {
                            break;
                        };
                        dispatch(&handler, &payload);
                    }
                    warn!(channel = %channel, "notification subscription ended");
                }
                Err(err) => {
                    error!(channel = %channel, error = %err, "failed to subscribe to notifications");
                }
            }

            let delay = backoff.next_delay();
            info!(?delay, "resubscribing after delay");
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }

        Ok(())
    }
}

fn dispatch(handler: &Arc<dyn NotificationHandler>, payload: &str) {
    let Some(notification) = Notification::parse(payload) else {
        warn!(payload, "ignoring blank notification");
        return;
    };

    let handler = Arc::clone(handler);
    tokio::spawn(async move {
        debug!(%notification, "handling change notification");
        if let Err(err) = handler.handle(notification.clone()).await {
            error!(%notification, error = %err, "failed to handle change notification");
        }
    });
}
