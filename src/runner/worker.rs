// src/runner/worker.rs

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::refresh::RefreshExecutor;
use crate::runner::RefreshRequest;

/// Spawn the background refresh worker.
///
/// The returned sender is what [`super::LocalTaskRunner`] submits attempts
/// to. Each request runs in its own Tokio task and answers on its reply
/// channel; a requester that stopped waiting is not an error. A request
/// whose `kill` token fires has its task aborted.
pub fn spawn_refresh_worker(executor: Arc<RefreshExecutor>) -> mpsc::Sender<RefreshRequest> {
    let (tx, mut rx) = mpsc::channel::<RefreshRequest>(32);

    tokio::spawn(async move {
        info!("refresh worker started");

        while let Some(request) = rx.recv().await {
            let RefreshRequest {
                category,
                abort,
                kill,
                reply,
            } = request;

            let executor = Arc::clone(&executor);
            let name = category.clone();
            let attempt = tokio::spawn(async move {
                let result = executor.run_until(&category, &abort).await;
                if reply.send(result).is_err() {
                    debug!(category = %category, "requester gone before refresh finished");
                }
            });

            let handle = attempt.abort_handle();
            tokio::spawn(async move {
                tokio::select! {
                    _ = attempt => {}
                    _ = kill.cancelled() => {
                        handle.abort();
                        warn!(category = %name, "refresh attempt killed");
                    }
                }
            });
        }

        info!("refresh worker finished (channel closed)");
    });

    tx
}
