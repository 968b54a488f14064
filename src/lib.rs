// src/lib.rs

pub mod bus;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fingerprint;
pub mod groups;
pub mod logging;
pub mod names;
pub mod refresh;
pub mod render;
pub mod runner;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bus::{ChangeBus, Notification};
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::Services;
use crate::names::HttpNameLookup;
use crate::render::DiscordPublisher;
use crate::store::KeySpace;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the shared store connection
/// - name service and chat publisher clients
/// - scheduler / runner / update engine
/// - the change listener and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let store = store::connect(&cfg.store.url)
        .await
        .with_context(|| format!("connecting to store at {}", cfg.store.url))?;

    if let Some(payload) = args.notify.as_deref() {
        let notification = Notification::parse(payload)
            .with_context(|| format!("invalid notification payload {payload:?}"))?;
        let bus = ChangeBus::new(store, KeySpace::new(cfg.store.key_prefix.clone()));
        bus.notify(&notification).await?;
        info!(%notification, "notification published");
        return Ok(());
    }

    let token = std::env::var(&cfg.discord.token_env)
        .with_context(|| format!("environment variable {} is not set", cfg.discord.token_env))?;
    let names = HttpNameLookup::new(
        cfg.names.url.clone(),
        Duration::from_secs(cfg.names.timeout_secs),
    )?;
    let publisher = DiscordPublisher::new(cfg.discord.api_base.clone(), token);

    let services = Services::wire(Arc::new(cfg), store, Arc::new(names), Arc::new(publisher));

    services
        .bus
        .publish_tracked_groups(&services.config.tracked_groups())
        .await?;
    services.engine.update_all_if_needed(true).await;

    if args.once {
        info!("--once: waiting for scheduled refreshes to finish");
        services.runner.wait_idle().await;
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("shutdown requested");
            shutdown.cancel();
        });
    }

    services
        .bus
        .listen(services.engine.clone(), shutdown)
        .await?;
    info!("rosterboard stopped");
    Ok(())
}

/// Simple dry-run output: print store, timings and categories.
fn print_dry_run(cfg: &ConfigFile) {
    println!("rosterboard dry-run");
    println!("  store.url = {}", cfg.store.url);
    println!("  store.key_prefix = {}", cfg.store.key_prefix);
    println!(
        "  scheduler = attempt {:?}, pending {:?}, retry {:?}, poll {:?}, {:?}",
        cfg.scheduler.attempt_timeout(),
        cfg.scheduler.pending_duration(),
        cfg.scheduler.retry_interval(),
        cfg.scheduler.poll_interval(),
        cfg.scheduler.pending_behaviour
    );
    println!();

    println!("categories ({}):", cfg.categories().len());
    for category in cfg.categories() {
        println!("  - {}", category.name);
        println!("      title: {}", category.title);
        println!("      channel: {}", category.channel_id);
        if let Some(message_id) = category.message_id {
            println!("      message: {message_id}");
        }
        println!("      color: #{:06x}", category.color);
        println!("      groups: {:?}", category.groups);
        if category.show_group_id {
            println!("      show_group_id: true");
        }
    }

    debug!("dry-run complete (no execution)");
}
