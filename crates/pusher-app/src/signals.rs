//! OS signal handling for graceful shutdown

use std::sync::Arc;

use pusher_core::prelude::*;
use tokio::sync::watch;

/// Spawn a task that raises the engine's shutdown flag on SIGINT/SIGTERM
pub fn spawn_signal_handler(shutdown_tx: Arc<watch::Sender<bool>>) {
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            error!("Signal handler error: {}", e);
            return;
        }

        request_shutdown(&shutdown_tx);
    });
}

/// Raise the shutdown flag; a flag already raised stays raised
fn request_shutdown(shutdown_tx: &watch::Sender<bool>) {
    info!("Shutdown signal received");
    shutdown_tx.send_replace(true);
}

/// Wait for a termination signal
async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())
            .map_err(|e| Error::config(format!("Failed to create SIGINT handler: {}", e)))?;
        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| Error::config(format!("Failed to create SIGTERM handler: {}", e)))?;

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
        }

        Ok(())
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shutdown_wakes_receivers() {
        let (tx, mut rx) = watch::channel(false);

        request_shutdown(&tx);

        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());

        request_shutdown(&tx);
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn test_handler_leaves_flag_down_without_signal() {
        let (tx, rx) = watch::channel(false);
        spawn_signal_handler(Arc::new(tx));

        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        assert!(!rx.has_changed().unwrap());
        assert!(!*rx.borrow());
    }
}
