//! Background task that flushes the [`Blocker`] on a fixed interval.
//!
//! Shutdown takes priority over a due tick and no final flush is made; ids
//! still pending at that point are lost.

use crate::{blocker::Blocker, config::BlockerConfig};
use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle, time::sleep};
use tracing::{debug, error, info};

/// Spawn the flush loop on the current runtime.
pub fn spawn(
    blocker: Arc<Blocker>,
    config: BlockerConfig,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run(blocker, config, shutdown))
}

/// Flush every `config.interval()` until `shutdown` flips to `true` or its
/// sender is dropped.
pub async fn run(
    blocker: Arc<Blocker>,
    config: BlockerConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let interval = config.normalize().interval();

    info!(interval_seconds = interval.as_secs(), "repeater: started");

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }

            () = sleep(interval) => {
                debug!(pending = blocker.len(), "repeater: passwords blocking");

                if let Err(err) = blocker.flush().await {
                    error!("repeater: blocking failed: {err}");
                }
            }
        }
    }

    info!("repeater: shutdown");
}
