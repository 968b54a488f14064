// src/engine/wiring.rs

use std::sync::Arc;

use crate::bus::ChangeBus;
use crate::config::ConfigFile;
use crate::engine::UpdateEngine;
use crate::groups::GroupSource;
use crate::names::NameLookup;
use crate::refresh::RefreshExecutor;
use crate::render::Publisher;
use crate::runner::{LocalTaskRunner, TaskLimits, spawn_refresh_worker};
use crate::scheduler::CoalescingScheduler;
use crate::state::CategoryStateRepository;
use crate::store::{KeySpace, StateStore};

/// Every long-lived component of one rosterboard process.
///
/// Must be built inside a Tokio runtime: wiring spawns the refresh worker.
pub struct Services {
    pub config: Arc<ConfigFile>,
    pub store: Arc<dyn StateStore>,
    pub keys: KeySpace,
    pub repo: CategoryStateRepository,
    pub groups: GroupSource,
    pub executor: Arc<RefreshExecutor>,
    pub runner: Arc<LocalTaskRunner>,
    pub scheduler: Arc<CoalescingScheduler>,
    pub engine: Arc<UpdateEngine>,
    pub bus: ChangeBus,
}

impl Services {
    pub fn wire(
        config: Arc<ConfigFile>,
        store: Arc<dyn StateStore>,
        names: Arc<dyn NameLookup>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        let keys = KeySpace::new(config.store.key_prefix.clone());
        let repo = CategoryStateRepository::new(Arc::clone(&store), keys.clone());
        let groups = GroupSource::new(Arc::clone(&store), keys.clone());

        let executor = Arc::new(RefreshExecutor::new(
            Arc::clone(&config),
            repo.clone(),
            groups.clone(),
            Arc::clone(&names),
            publisher,
        ));

        let worker = spawn_refresh_worker(Arc::clone(&executor));
        let runner = Arc::new(LocalTaskRunner::new(
            worker,
            TaskLimits::from(&config.scheduler),
        ));

        let scheduler = Arc::new(CoalescingScheduler::new(
            Arc::clone(&config),
            repo.clone(),
            groups.clone(),
            names,
            runner.clone(),
        ));
        let engine = Arc::new(UpdateEngine::new(Arc::clone(&config), Arc::clone(&scheduler)));
        let bus = ChangeBus::new(Arc::clone(&store), keys.clone());

        Self {
            config,
            store,
            keys,
            repo,
            groups,
            executor,
            runner,
            scheduler,
            engine,
            bus,
        }
    }
}
