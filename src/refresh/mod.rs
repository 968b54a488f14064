// src/refresh/mod.rs

//! Refreshing a category's destination.
//!
//! [`collect_snapshot`] gathers what a refresh (and the "needs update?"
//! check) depends on; [`executor::RefreshExecutor`] performs one refresh
//! attempt and keeps the category's state record in step.

use std::collections::HashMap;

use tracing::warn;

use crate::config::CategoryConfig;
use crate::errors::Result;
use crate::fingerprint::compute_fingerprint;
use crate::groups::{GroupData, GroupSource, all_members};
use crate::names::{NameLookup, display_names};
use crate::types::PlayerId;

pub mod executor;

pub use executor::RefreshExecutor;

/// Current group data of one category with resolved member names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub groups: Vec<GroupData>,
    pub names: HashMap<PlayerId, String>,
    pub fingerprint: u64,
}

/// Fetch the category's groups and resolve member names.
///
/// A failing name lookup is logged and degrades to an empty name map; only
/// store errors are returned.
pub async fn collect_snapshot(
    groups: &GroupSource,
    names: &dyn NameLookup,
    category: &CategoryConfig,
) -> Result<Snapshot> {
    let groups = groups.fetch_all(&category.groups).await?;
    let members = all_members(&groups);

    let names = match display_names(names, &members).await {
        Ok(names) => names,
        Err(err) => {
            warn!(
                category = %category.name,
                error = %err,
                "failed to resolve player names; continuing without them"
            );
            HashMap::new()
        }
    };

    let fingerprint = compute_fingerprint(&groups, &names);
    Ok(Snapshot {
        groups,
        names,
        fingerprint,
    })
}
