// src/store/memory.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::errors::{Result, RosterError};
use crate::store::StateStore;
use crate::types::BoxFuture;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    records: HashMap<String, HashMap<String, String>>,
    channels: HashMap<String, broadcast::Sender<String>>,
}

/// In-process [`StateStore`].
///
/// Besides serving single-process deployments, it can simulate an outage
/// ([`MemoryStore::set_available`]) and a dropped pub/sub connection
/// ([`MemoryStore::drop_subscribers`]).
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryInner::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggle simulated connectivity. While unavailable every call fails
    /// with a store error.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// End every open subscription on `channel`, as if the connection had
    /// dropped.
    pub fn drop_subscribers(&self, channel: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            if inner.channels.remove(channel).is_some() {
                debug!(channel, "dropped in-memory subscribers");
            }
        }
    }

    /// Number of live subscriptions on `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.channels.get(channel).map(|tx| tx.receiver_count()))
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryInner>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(RosterError::StoreError("store unavailable".to_string()));
        }
        self.inner
            .lock()
            .map_err(|_| RosterError::StoreError("memory store mutex poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<String>>> {
        let result = self.lock().map(|inner| inner.values.get(key).cloned());
        Box::pin(async move { result })
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, Result<()>> {
        let result = self.lock().map(|mut inner| {
            inner.values.insert(key.to_string(), value.to_string());
        });
        Box::pin(async move { result })
    }

    fn get_fields(&self, key: &str) -> BoxFuture<'_, Result<HashMap<String, String>>> {
        let result = self
            .lock()
            .map(|inner| inner.records.get(key).cloned().unwrap_or_default());
        Box::pin(async move { result })
    }

    fn get_field(&self, key: &str, field: &str) -> BoxFuture<'_, Result<Option<String>>> {
        let result = self.lock().map(|inner| {
            inner
                .records
                .get(key)
                .and_then(|record| record.get(field).cloned())
        });
        Box::pin(async move { result })
    }

    fn set_field(&self, key: &str, field: &str, value: &str) -> BoxFuture<'_, Result<()>> {
        let result = self.lock().map(|mut inner| {
            inner
                .records
                .entry(key.to_string())
                .or_default()
                .insert(field.to_string(), value.to_string());
        });
        Box::pin(async move { result })
    }

    fn set_fields(&self, key: &str, fields: Vec<(String, String)>) -> BoxFuture<'_, Result<()>> {
        let result = self.lock().map(|mut inner| {
            inner
                .records
                .entry(key.to_string())
                .or_default()
                .extend(fields);
        });
        Box::pin(async move { result })
    }

    fn publish(&self, channel: &str, message: &str) -> BoxFuture<'_, Result<()>> {
        let result = self.lock().map(|inner| {
            if let Some(tx) = inner.channels.get(channel) {
                // Zero receivers is not an error for pub/sub.
                let _ = tx.send(message.to_string());
            }
        });
        Box::pin(async move { result })
    }

    fn subscribe(&self, channel: &str) -> BoxFuture<'_, Result<BoxStream<'static, String>>> {
        let result = self.lock().map(|mut inner| {
            let tx = inner
                .channels
                .entry(channel.to_string())
                .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
            let rx = tx.subscribe();
            receiver_stream(rx, channel.to_string())
        });
        Box::pin(async move { result })
    }
}

fn receiver_stream(
    rx: broadcast::Receiver<String>,
    channel: String,
) -> BoxStream<'static, String> {
    futures::stream::unfold((rx, channel), |(mut rx, channel)| async move {
        loop {
            match rx.recv().await {
                Ok(message) => return Some((message, (rx, channel))),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(channel = %channel, skipped, "subscriber lagged; messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .boxed()
}
