use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// Stop accepting connections, finish in-flight requests, close the pool
    Graceful,
}

/// Spawn a task that broadcasts [`ShutdownSignal::Graceful`] on the first
/// SIGTERM or SIGINT (Ctrl+C elsewhere).
pub fn setup_signal_handlers() -> (broadcast::Sender<ShutdownSignal>, JoinHandle<()>) {
    let (shutdown_tx, _) = broadcast::channel(16);
    let tx = shutdown_tx.clone();

    let handle = tokio::spawn(async move {
        match wait_for_termination().await {
            Ok(name) => {
                info!(signal = name, "Termination signal received, initiating graceful shutdown");
                let _ = tx.send(ShutdownSignal::Graceful);
            }
            Err(e) => error!("Failed to listen for termination signals: {}", e),
        }
    });

    (shutdown_tx, handle)
}

#[cfg(unix)]
async fn wait_for_termination() -> std::io::Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}
