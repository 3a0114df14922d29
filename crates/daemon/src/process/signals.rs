use std::fmt;
use std::time::Duration;

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::ServiceConfig;

/// How long in-flight requests get after SIGTERM before the listener closes
const TERMINATE_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// What ended the daemon's run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Interrupt => f.write_str("SIGINT"),
            ShutdownReason::Terminate => f.write_str("SIGTERM"),
            ShutdownReason::Requested => f.write_str("shutdown request"),
        }
    }
}

/// Install SIGINT/SIGTERM handlers and spawn the task that turns the first of them, or
/// a send on the returned sender, into a shutdown broadcast.
///
/// Every receiver cloned from the returned one observes the broadcast. Secrets live
/// only in memory, so whatever is still stored is dropped with the process.
pub fn shutdown_listener(
) -> std::io::Result<(JoinHandle<ShutdownReason>, watch::Sender<()>, watch::Receiver<()>)> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let (tx, rx) = watch::channel(());
    let broadcast = tx.clone();
    let mut requested = rx.clone();

    let handle = tokio::spawn(async move {
        let reason = first_signal(&mut sigint, &mut sigterm, &mut requested).await;
        if reason == ShutdownReason::Terminate {
            tracing::debug!(
                "draining requests for {}s before shutdown",
                TERMINATE_GRACE_PERIOD.as_secs()
            );
            tokio::time::sleep(TERMINATE_GRACE_PERIOD).await;
        }
        tracing::info!("shutting down on {}", reason);
        let _ = broadcast.send(());
        reason
    });

    Ok((handle, tx, rx))
}

async fn first_signal(
    sigint: &mut Signal,
    sigterm: &mut Signal,
    requested: &mut watch::Receiver<()>,
) -> ShutdownReason {
    tokio::select! {
        _ = sigint.recv() => ShutdownReason::Interrupt,
        _ = sigterm.recv() => ShutdownReason::Terminate,
        _ = requested.changed() => ShutdownReason::Requested,
    }
}

/// Route panics through `tracing` so they reach the log file as well as stderr
pub fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| match panic.location() {
        Some(loc) => {
            tracing::error!(
                message = %panic,
                panic.file = loc.file(),
                panic.line = loc.line(),
                panic.column = loc.column(),
            );
        }
        None => tracing::error!(message = %panic),
    }));
}

pub fn log_startup(service_config: &ServiceConfig) {
    let build = common::prelude::build_info();

    tracing::info!(
        version = build.version,
        build_profile = build.build_profile,
        default_ttl_secs = service_config.default_ttl.as_secs(),
        min_ttl_secs = service_config.min_ttl.as_secs(),
        max_ttl_secs = service_config.max_ttl.as_secs(),
        sweep_interval_secs = service_config.sweep_interval.as_secs(),
        "sealdrop daemon starting"
    );
}
