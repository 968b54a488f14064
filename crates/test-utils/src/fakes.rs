#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rosterboard::errors::{Result, RosterError};
use rosterboard::names::{NameLookup, NameLookupError, PlayerFields};
use rosterboard::render::{Destination, PublishReceipt, Publisher, RenderedMessage};
use rosterboard::runner::{TaskRunner, TaskSpec};
use rosterboard::types::{BoxFuture, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NamesMode {
    Answer,
    Fail,
    Hang,
}

/// A fake name service that:
/// - answers from an in-memory table (players it does not know get `null`)
/// - can be switched to fail or to never answer
pub struct FakeNames {
    names: Mutex<HashMap<PlayerId, String>>,
    mode: Mutex<NamesMode>,
    calls: AtomicUsize,
}

impl FakeNames {
    pub fn new() -> Self {
        Self {
            names: Mutex::new(HashMap::new()),
            mode: Mutex::new(NamesMode::Answer),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(self, player: &str, name: &str) -> Self {
        self.set(player, name);
        self
    }

    pub fn set(&self, player: &str, name: &str) {
        self.names
            .lock()
            .unwrap()
            .insert(player.to_string(), name.to_string());
    }

    pub fn fail(&self) {
        *self.mode.lock().unwrap() = NamesMode::Fail;
    }

    pub fn hang(&self) {
        *self.mode.lock().unwrap() = NamesMode::Hang;
    }

    pub fn answer(&self) {
        *self.mode.lock().unwrap() = NamesMode::Answer;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FakeNames {
    fn default() -> Self {
        Self::new()
    }
}

impl NameLookup for FakeNames {
    fn query<'a>(
        &'a self,
        players: &'a [PlayerId],
        fields: &'a [&'a str],
    ) -> BoxFuture<'a, std::result::Result<PlayerFields, NameLookupError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mode = *self.mode.lock().unwrap();
            match mode {
                NamesMode::Fail => {
                    return Err(NameLookupError::Status {
                        code: 500,
                        detail: "fake failure".to_string(),
                    });
                }
                NamesMode::Hang => {
                    std::future::pending::<()>().await;
                }
                NamesMode::Answer => {}
            }

            let names = self.names.lock().unwrap();
            Ok(players
                .iter()
                .map(|player| {
                    let data = fields
                        .iter()
                        .map(|field| (field.to_string(), names.get(player).cloned()))
                        .collect();
                    (player.clone(), data)
                })
                .collect())
        })
    }
}

/// A fake publisher that records every publish and hands out message ids.
///
/// Failures can be queued with [`RecordingPublisher::fail_next`]; a delay
/// can be set to simulate a slow destination.
pub struct RecordingPublisher {
    published: Mutex<Vec<(Destination, RenderedMessage)>>,
    failures_left: AtomicUsize,
    next_message_id: AtomicU64,
    delay: Mutex<Option<Duration>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            failures_left: AtomicUsize::new(0),
            next_message_id: AtomicU64::new(9000),
            delay: Mutex::new(None),
        }
    }

    /// Fail the next `n` publish calls.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn published(&self) -> Vec<(Destination, RenderedMessage)> {
        self.published.lock().unwrap().clone()
    }

    pub fn publish_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<(Destination, RenderedMessage)> {
        self.published.lock().unwrap().last().cloned()
    }
}

impl Default for RecordingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for RecordingPublisher {
    fn publish<'a>(
        &'a self,
        destination: Destination,
        message: &'a RenderedMessage,
    ) -> BoxFuture<'a, Result<PublishReceipt>> {
        Box::pin(async move {
            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(RosterError::PublishError("fake publish failure".to_string()));
            }

            let message_id = destination
                .message_id
                .unwrap_or_else(|| self.next_message_id.fetch_add(1, Ordering::SeqCst));
            self.published
                .lock()
                .unwrap()
                .push((destination, message.clone()));
            Ok(PublishReceipt { message_id })
        })
    }
}

/// A fake task runner that records which tasks were scheduled and
/// cancelled, and never runs anything.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    scheduled: Arc<Mutex<Vec<TaskSpec>>>,
    cancelled: Arc<Mutex<Vec<String>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> Vec<TaskSpec> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl TaskRunner for RecordingRunner {
    fn schedule(&self, task: TaskSpec) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.scheduled.lock().unwrap().push(task);
            Ok(())
        })
    }

    fn cancel<'a>(&'a self, task_id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.cancelled.lock().unwrap().push(task_id.to_string());
            Ok(())
        })
    }
}
