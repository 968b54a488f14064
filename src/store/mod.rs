// src/store/mod.rs

//! Shared state store capability.
//!
//! The scheduler, the executor and the notification bus never talk to a
//! concrete backend. They go through [`StateStore`], a narrow key-value +
//! hash + pub/sub interface:
//!
//! - [`memory::MemoryStore`] keeps everything in-process (single-process
//!   deployments and tests).
//! - [`redis::RedisStore`] is the production backend shared by every
//!   process.
//!
//! Hash fields are written one at a time; per-field writes are the only
//! atomicity the rest of the crate relies on.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::BoxStream;

use crate::errors::Result;
use crate::types::BoxFuture;

pub mod memory;
pub mod redis;

pub use memory::MemoryStore;
pub use self::redis::RedisStore;

/// Narrow interface over the shared key-value/pub-sub store.
pub trait StateStore: Send + Sync {
    /// Read a plain value.
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<String>>>;

    /// Overwrite a plain value.
    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, Result<()>>;

    /// Read every field of a record. Absent records yield an empty map.
    fn get_fields(&self, key: &str) -> BoxFuture<'_, Result<HashMap<String, String>>>;

    /// Read one field of a record.
    fn get_field(&self, key: &str, field: &str) -> BoxFuture<'_, Result<Option<String>>>;

    /// Atomically write one field of a record, creating the record if needed.
    fn set_field(&self, key: &str, field: &str, value: &str) -> BoxFuture<'_, Result<()>>;

    /// Write several fields of a record in one call.
    fn set_fields(&self, key: &str, fields: Vec<(String, String)>) -> BoxFuture<'_, Result<()>>;

    /// Broadcast a message on a channel.
    fn publish(&self, channel: &str, message: &str) -> BoxFuture<'_, Result<()>>;

    /// Subscribe to a channel.
    ///
    /// The stream ends when the underlying connection is lost; callers are
    /// expected to resubscribe.
    fn subscribe(&self, channel: &str) -> BoxFuture<'_, Result<BoxStream<'static, String>>>;
}

/// Connect to the store named by `url`.
///
/// `memory://` selects the in-process store; anything else is handed to
/// the Redis client.
pub async fn connect(url: &str) -> Result<Arc<dyn StateStore>> {
    if url.starts_with("memory://") {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = RedisStore::connect(url).await?;
    Ok(Arc::new(store))
}

/// Key layout shared by every process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Group data record. Producers store group ids lowercased.
    pub fn group(&self, group_id: &str) -> String {
        format!("{}{}", self.prefix, group_id.to_lowercase())
    }

    pub fn updates_channel(&self) -> String {
        format!("{}updates", self.prefix)
    }

    pub fn tracked_groups(&self) -> String {
        format!("{}tracked_groups", self.prefix)
    }

    pub fn category_state(&self, category: &str) -> String {
        format!("{}internal:{}", self.prefix, category)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new("permission_groups:")
    }
}
