// src/groups.rs

//! Externally owned group membership data.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::Result;
use crate::store::{KeySpace, StateStore};
use crate::types::PlayerId;

/// One group as published by the group producers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupData {
    pub id: String,
    pub prefix: String,
    #[serde(default)]
    pub members: Vec<PlayerId>,
}

/// Reads group records from the shared store. Nothing is cached: every call
/// goes to the store.
#[derive(Clone)]
pub struct GroupSource {
    store: Arc<dyn StateStore>,
    keys: KeySpace,
}

impl GroupSource {
    pub fn new(store: Arc<dyn StateStore>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    /// Fetch one group; `None` if no producer has published it.
    pub async fn fetch(&self, group_id: &str) -> Result<Option<GroupData>> {
        let key = self.keys.group(group_id);
        match self.store.get(&key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Fetch all `group_ids` concurrently, keeping configuration order.
    /// Missing groups are skipped with a warning.
    pub async fn fetch_all(&self, group_ids: &[String]) -> Result<Vec<GroupData>> {
        let results = join_all(group_ids.iter().map(|id| self.fetch(id))).await;

        let mut groups = Vec::with_capacity(group_ids.len());
        for (id, result) in group_ids.iter().zip(results) {
            match result? {
                Some(group) => groups.push(group),
                None => warn!(group = %id, "group data missing from store; skipping"),
            }
        }
        Ok(groups)
    }

    /// Publish a group record. Used by producers and fixtures.
    pub async fn put(&self, group: &GroupData) -> Result<()> {
        let key = self.keys.group(&group.id);
        let raw = serde_json::to_string(group)?;
        self.store.set(&key, &raw).await
    }
}

/// Every member of `groups`, in order, duplicates included.
pub fn all_members(groups: &[GroupData]) -> Vec<PlayerId> {
    groups
        .iter()
        .flat_map(|g| g.members.iter().cloned())
        .collect()
}
