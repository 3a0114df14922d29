use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::ServiceState;

/// Periodically drop expired secrets until shutdown is signalled.
///
/// Reapers already free records at their deadline; this catches anything stored
/// while no runtime was available and bounds memory if a reaper is delayed.
pub async fn run(state: ServiceState, every: Duration, mut shutdown_rx: watch::Receiver<()>) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let purged = state.secrets().purge_expired();
                if purged > 0 {
                    tracing::info!(purged, remaining = state.secrets().len(), "swept expired secrets");
                }
            }
            _ = shutdown_rx.changed() => {
                tracing::debug!("sweeper stopping");
                break;
            }
        }
    }
}
