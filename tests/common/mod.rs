#![allow(dead_code)]

use std::sync::Arc;

use rosterboard::config::ConfigFile;
use rosterboard::engine::Services;
use rosterboard::groups::{GroupData, GroupSource};
use rosterboard::scheduler::CoalescingScheduler;
use rosterboard::state::{CategoryState, CategoryStateRepository};
use rosterboard::store::{KeySpace, MemoryStore};
use rosterboard_test_utils::fakes::{FakeNames, RecordingPublisher, RecordingRunner};

pub fn group(id: &str, prefix: &str, members: &[&str]) -> GroupData {
    GroupData {
        id: id.to_string(),
        prefix: prefix.to_string(),
        members: members.iter().map(|m| m.to_string()).collect(),
    }
}

/// Fully wired process over an in-memory store, with fake names and a
/// recording publisher. Must be created inside a Tokio runtime.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub names: Arc<FakeNames>,
    pub publisher: Arc<RecordingPublisher>,
    pub services: Services,
}

impl Harness {
    pub fn new(config: ConfigFile) -> Self {
        Self::with_names(config, FakeNames::new())
    }

    pub fn with_names(config: ConfigFile, names: FakeNames) -> Self {
        let store = Arc::new(MemoryStore::new());
        let names = Arc::new(names);
        let publisher = Arc::new(RecordingPublisher::new());
        let services = Services::wire(
            Arc::new(config),
            store.clone(),
            names.clone(),
            publisher.clone(),
        );
        Self {
            store,
            names,
            publisher,
            services,
        }
    }

    pub async fn put_group(&self, id: &str, prefix: &str, members: &[&str]) {
        self.services
            .groups
            .put(&group(id, prefix, members))
            .await
            .unwrap();
    }

    pub async fn state(&self, category: &str) -> CategoryState {
        self.services.repo.fetch(category).await.unwrap()
    }
}

/// Scheduler whose runner only records; nothing is ever executed.
pub struct RecordingSetup {
    pub store: Arc<MemoryStore>,
    pub names: Arc<FakeNames>,
    pub runner: RecordingRunner,
    pub repo: CategoryStateRepository,
    pub groups: GroupSource,
    pub scheduler: CoalescingScheduler,
    pub config: Arc<ConfigFile>,
}

impl RecordingSetup {
    pub fn new(config: ConfigFile) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(MemoryStore::new());
        let keys = KeySpace::new(config.store.key_prefix.clone());
        let names = Arc::new(FakeNames::new());
        let runner = RecordingRunner::new();
        let repo = CategoryStateRepository::new(store.clone(), keys.clone());
        let groups = GroupSource::new(store.clone(), keys);
        let scheduler = CoalescingScheduler::new(
            Arc::clone(&config),
            repo.clone(),
            groups.clone(),
            names.clone(),
            Arc::new(runner.clone()),
        );
        Self {
            store,
            names,
            runner,
            repo,
            groups,
            scheduler,
            config,
        }
    }

    pub fn category(&self, name: &str) -> &rosterboard::config::CategoryConfig {
        self.config.category(name).unwrap()
    }
}
