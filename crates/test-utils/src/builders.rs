#![allow(dead_code)]

use rosterboard::config::{
    ConfigFile, DiscordSection, NamesSection, RawCategory, RawConfigFile, SchedulerSection,
    StoreSection,
};
use rosterboard::types::PendingBehaviour;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the in-memory store and the default timings.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                store: StoreSection {
                    url: "memory://".to_string(),
                    ..StoreSection::default()
                },
                scheduler: SchedulerSection::default(),
                names: NamesSection::default(),
                discord: DiscordSection::default(),
                categories: vec![],
            },
        }
    }

    pub fn with_category(mut self, category: CategoryBuilder) -> Self {
        self.config.categories.push(category.build());
        self
    }

    pub fn with_key_prefix(mut self, prefix: &str) -> Self {
        self.config.store.key_prefix = prefix.to_string();
        self
    }

    pub fn with_attempt_timeout_secs(mut self, secs: u64) -> Self {
        self.config.scheduler.attempt_timeout_secs = secs;
        self
    }

    pub fn with_pending_duration_secs(mut self, secs: u64) -> Self {
        self.config.scheduler.pending_duration_secs = secs;
        self
    }

    pub fn with_retry_interval_secs(mut self, secs: u64) -> Self {
        self.config.scheduler.retry_interval_secs = secs;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.scheduler.poll_interval_ms = ms;
        self
    }

    pub fn with_pending_behaviour(mut self, behaviour: PendingBehaviour) -> Self {
        self.config.scheduler.pending_behaviour = behaviour;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `[[category]]` entries.
pub struct CategoryBuilder {
    category: RawCategory,
}

impl CategoryBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            category: RawCategory {
                name: name.to_string(),
                channel_id: 1000,
                message_id: None,
                title: name.to_string(),
                color: "#ffffff".to_string(),
                show_group_id: false,
                groups: vec![],
            },
        }
    }

    pub fn group(mut self, group: &str) -> Self {
        self.category.groups.push(group.to_string());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.category.title = title.to_string();
        self
    }

    pub fn channel(mut self, channel_id: u64) -> Self {
        self.category.channel_id = channel_id;
        self
    }

    pub fn message(mut self, message_id: u64) -> Self {
        self.category.message_id = Some(message_id);
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        self.category.color = color.to_string();
        self
    }

    pub fn show_group_id(mut self) -> Self {
        self.category.show_group_id = true;
        self
    }

    pub fn build(self) -> RawCategory {
        self.category
    }
}
