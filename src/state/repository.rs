// src/state/repository.rs

//! Typed access to [`CategoryState`] records in the shared store.
//!
//! Each record field is stored as its own JSON-encoded value so that a
//! partial update is a single atomic field write. Raw store values are
//! parsed here and never leak further.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::Result;
use crate::state::{CategoryState, StateField, TaskStatus};
use crate::store::{KeySpace, StateStore};

#[derive(Clone)]
pub struct CategoryStateRepository {
    store: Arc<dyn StateStore>,
    keys: KeySpace,
}

impl CategoryStateRepository {
    pub fn new(store: Arc<dyn StateStore>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    /// Fetch the full record, creating and persisting the default record if
    /// none exists yet.
    pub async fn fetch(&self, category: &str) -> Result<CategoryState> {
        let key = self.keys.category_state(category);
        let fields = self.store.get_fields(&key).await?;

        if fields.is_empty() {
            let state = CategoryState::default();
            self.store.set_fields(&key, encode_state(&state)?).await?;
            debug!(category, "created default category state");
            return Ok(state);
        }

        let mut object = serde_json::Map::with_capacity(fields.len());
        for (field, raw) in fields {
            object.insert(field, serde_json::from_str(&raw)?);
        }
        let state: CategoryState = serde_json::from_value(serde_json::Value::Object(object))?;
        Ok(state)
    }

    /// Read a single field, returning `default` when the record or the field
    /// is absent (or holds `null`).
    pub async fn fetch_field<T>(&self, category: &str, field: StateField, default: T) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let key = self.keys.category_state(category);
        let Some(raw) = self.store.get_field(&key, field.as_str()).await? else {
            return Ok(default);
        };

        let value: serde_json::Value = serde_json::from_str(&raw)?;
        if value.is_null() {
            return Ok(default);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Atomically overwrite one field.
    pub async fn update_field<T>(&self, category: &str, field: StateField, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let key = self.keys.category_state(category);
        let encoded = serde_json::to_string(value)?;
        self.store.set_field(&key, field.as_str(), &encoded).await
    }

    pub async fn set_status(&self, category: &str, status: TaskStatus) -> Result<()> {
        self.update_field(category, StateField::Status, &status).await
    }

    pub async fn set_task_id(&self, category: &str, task_id: Option<&str>) -> Result<()> {
        self.update_field(category, StateField::TaskId, &task_id).await
    }

    /// Deadlines are stored as unix seconds.
    pub async fn set_deadline(&self, category: &str, deadline: Option<DateTime<Utc>>) -> Result<()> {
        let seconds = deadline.map(|d| d.timestamp());
        self.update_field(category, StateField::Deadline, &seconds).await
    }

    pub async fn set_remote_hash(&self, category: &str, hash: u64) -> Result<()> {
        self.update_field(category, StateField::CurrentRemoteHash, &hash).await
    }

    pub async fn set_message_id(&self, category: &str, message_id: Option<u64>) -> Result<()> {
        self.update_field(category, StateField::MessageId, &message_id).await
    }

    /// Current fingerprint of the published content, 0 if never published.
    pub async fn remote_hash(&self, category: &str) -> Result<u64> {
        self.fetch_field(category, StateField::CurrentRemoteHash, 0u64).await
    }
}

fn encode_state(state: &CategoryState) -> Result<Vec<(String, String)>> {
    let value = serde_json::to_value(state)?;
    let mut fields = Vec::new();
    if let serde_json::Value::Object(object) = value {
        for (field, value) in object {
            fields.push((field, serde_json::to_string(&value)?));
        }
    }
    Ok(fields)
}
