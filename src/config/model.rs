// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::{CategoryName, PendingBehaviour};

/// Configuration exactly as read from the TOML file.
///
/// ```toml
/// [store]
/// url = "redis://127.0.0.1/"
///
/// [scheduler]
/// pending_duration_secs = 5
///
/// [[category]]
/// name = "staff"
/// channel_id = 1234
/// message_id = 5678
/// title = "Staff"
/// color = "#ff8800"
/// groups = ["admin", "moderator"]
/// ```
///
/// Every section except `[[category]]` is optional. Use
/// [`ConfigFile::try_from`] to obtain a validated configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub scheduler: SchedulerSection,

    #[serde(default)]
    pub names: NamesSection,

    #[serde(default)]
    pub discord: DiscordSection,

    #[serde(default, rename = "category")]
    pub categories: Vec<RawCategory>,
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// Connection URL of the shared store. `memory://` keeps everything
    /// in-process (single-process deployments, tests).
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Prefix applied to every key and channel.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_store_url() -> String {
    "redis://127.0.0.1/".to_string()
}

fn default_key_prefix() -> String {
    "permission_groups:".to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

/// `[scheduler]` section: timings of the coalescing scheduler and the
/// task runner.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SchedulerSection {
    /// Soft time limit of one refresh attempt, and how long a request waits
    /// for an executing refresh to finish.
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,

    /// Debounce window between a change notification and the refresh.
    #[serde(default = "default_pending_duration_secs")]
    pub pending_duration_secs: u64,

    /// Fixed delay between failed attempts.
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,

    /// How often a request re-reads an executing category's state.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub pending_behaviour: PendingBehaviour,
}

fn default_attempt_timeout_secs() -> u64 {
    30
}

fn default_pending_duration_secs() -> u64 {
    5
}

fn default_retry_interval_secs() -> u64 {
    10
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            attempt_timeout_secs: default_attempt_timeout_secs(),
            pending_duration_secs: default_pending_duration_secs(),
            retry_interval_secs: default_retry_interval_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            pending_behaviour: PendingBehaviour::default(),
        }
    }
}

impl SchedulerSection {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn pending_duration(&self) -> Duration {
        Duration::from_secs(self.pending_duration_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// `[names]` section: the player display-name service.
#[derive(Debug, Clone, Deserialize)]
pub struct NamesSection {
    #[serde(default = "default_names_url")]
    pub url: String,

    #[serde(default = "default_names_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_names_url() -> String {
    "http://player-data-service".to_string()
}

fn default_names_timeout_secs() -> u64 {
    5
}

impl Default for NamesSection {
    fn default() -> Self {
        Self {
            url: default_names_url(),
            timeout_secs: default_names_timeout_secs(),
        }
    }
}

/// `[discord]` section. The token itself never lives in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordSection {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the bot token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_token_env() -> String {
    "DISCORD_TOKEN".to_string()
}

impl Default for DiscordSection {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token_env: default_token_env(),
        }
    }
}

/// `[[category]]` entry as written in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    pub name: CategoryName,
    pub channel_id: u64,
    #[serde(default)]
    pub message_id: Option<u64>,
    pub title: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub show_group_id: bool,
    #[serde(default)]
    pub groups: Vec<String>,
}

fn default_color() -> String {
    "#ffffff".to_string()
}

/// A validated category: the static description of one refresh target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryConfig {
    pub name: CategoryName,
    pub channel_id: u64,
    pub message_id: Option<u64>,
    pub title: String,
    /// `0xRRGGBB`.
    pub color: u32,
    pub show_group_id: bool,
    pub groups: Vec<String>,
}

impl CategoryConfig {
    /// Whether this category aggregates the given group (ids compare
    /// case-insensitively, as group keys are stored lowercased).
    pub fn tracks_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g.eq_ignore_ascii_case(group))
    }
}

/// Validated configuration.
///
/// Only constructible through [`TryFrom<RawConfigFile>`], so holders can
/// rely on the invariants checked in `validate.rs`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub store: StoreSection,
    pub scheduler: SchedulerSection,
    pub names: NamesSection,
    pub discord: DiscordSection,
    categories: Vec<CategoryConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        raw: RawConfigFile,
        categories: Vec<CategoryConfig>,
    ) -> Self {
        Self {
            store: raw.store,
            scheduler: raw.scheduler,
            names: raw.names,
            discord: raw.discord,
            categories,
        }
    }

    /// Categories in file order.
    pub fn categories(&self) -> &[CategoryConfig] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Categories aggregating `group`.
    pub fn categories_for_group<'a>(
        &'a self,
        group: &'a str,
    ) -> impl Iterator<Item = &'a CategoryConfig> + 'a {
        self.categories.iter().filter(move |c| c.tracks_group(group))
    }

    /// Every group referenced by any category, sorted and deduplicated.
    pub fn tracked_groups(&self) -> std::collections::BTreeSet<String> {
        self.categories
            .iter()
            .flat_map(|c| c.groups.iter().cloned())
            .collect()
    }
}
