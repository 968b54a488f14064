//! Shared helpers for the rosterboard integration tests.
//!
//! - [`builders`]: config builders that start from an in-memory store.
//! - [`fakes`]: name lookup, publisher and task runner doubles.

pub mod builders;
pub mod fakes;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests, once per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests.
/// Scheduler and runner events are at `debug`; narrow them with e.g.
/// `RUST_LOG=rosterboard::scheduler=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}
