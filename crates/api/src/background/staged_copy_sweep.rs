//! Periodic removal of expired prepared copies.
//!
//! Expired entries are already invisible to commits; this only frees their
//! memory.

use std::sync::Arc;
use std::time::Duration;

use procflow_engine::StagedCopyStore;
use tokio_util::sync::CancellationToken;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(store: Arc<StagedCopyStore>, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Staged copy sweep started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Staged copy sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let purged = store.purge_expired().await;
                if purged > 0 {
                    tracing::info!(purged, "Staged copy sweep: dropped expired copies");
                } else {
                    tracing::debug!("Staged copy sweep: nothing expired");
                }
            }
        }
    }
}
