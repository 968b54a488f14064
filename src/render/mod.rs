// src/render/mod.rs

//! Rendering category rosters and publishing them to a chat destination.
//!
//! - [`render_category`] turns groups + names into a [`RenderedMessage`].
//! - [`publisher::Publisher`] abstracts the chat platform;
//!   [`discord::DiscordPublisher`] is the production implementation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::CategoryConfig;
use crate::groups::GroupData;
use crate::types::PlayerId;

pub mod discord;
pub mod publisher;

pub use discord::DiscordPublisher;
pub use publisher::{Destination, PublishReceipt, Publisher};

/// Placeholder for members whose name could not be resolved.
pub const UNKNOWN_NAME: &str = "UNKNOWN";

/// Rich message describing one category. Serializes as a Discord embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub timestamp: DateTime<Utc>,
}

/// Render the roster of `category`.
///
/// ```text
/// - **Admins** - *admin*
///   1. 7656119 - Alice
///   2. 7656120 - Bob
/// -
/// - **Moderators**
///   1. 7656121 - UNKNOWN
/// ```
pub fn render_category(
    category: &CategoryConfig,
    groups: &[GroupData],
    names: &HashMap<PlayerId, String>,
    now: DateTime<Utc>,
) -> RenderedMessage {
    let sections: Vec<String> = groups
        .iter()
        .map(|group| render_group(group, names, category.show_group_id))
        .collect();

    RenderedMessage {
        title: category.title.clone(),
        description: sections.join("\n-\n").trim().to_string(),
        color: category.color,
        timestamp: now,
    }
}

fn render_group(group: &GroupData, names: &HashMap<PlayerId, String>, show_id: bool) -> String {
    let header = if show_id {
        format!("- **{}** - *{}*", group.prefix, group.id)
    } else {
        format!("- **{}**", group.prefix)
    };

    let members: Vec<String> = group
        .members
        .iter()
        .enumerate()
        .map(|(i, member)| {
            let name = names.get(member).map(String::as_str).unwrap_or(UNKNOWN_NAME);
            format!("  {}. {} - {}", i + 1, member, name)
        })
        .collect();

    format!("{}\n{}", header, members.join("\n"))
}
