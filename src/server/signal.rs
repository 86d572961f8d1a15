// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)
// - SIGUSR1: Reopen log files

use std::io;
use std::sync::Arc;
use tokio::sync::watch;

use crate::logger;

/// Shutdown flag shared by the accept loop and every connection
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Receiver that observes the flag, including a trigger that already happened
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Start signal handlers (Unix only)
///
/// Registration happens before this returns, so a failure to install a
/// handler is reported to the caller instead of inside the spawned task.
///
/// | Signal  | Action              |
/// |---------|---------------------|
/// | SIGTERM | Graceful shutdown   |
/// | SIGINT  | Graceful shutdown   |
/// | SIGUSR1 | Reopen log files    |
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Shutdown>) -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    logger::log_info(&format!(
        "[Signal] SIGTERM/SIGINT: graceful shutdown, SIGUSR1: reopen logs (pid {})",
        std::process::id()
    ));

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    logger::log_info("[Signal] SIGTERM received, shutting down");
                    shutdown.trigger();
                    break;
                }
                _ = sigint.recv() => {
                    logger::log_info("[Signal] SIGINT received, shutting down");
                    shutdown.trigger();
                    break;
                }
                _ = sigusr1.recv() => {
                    logger::reopen();
                }
            }
        }
    });

    Ok(())
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Shutdown>) -> io::Result<()> {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_info("[Signal] Ctrl+C received, shutting down");
            shutdown.trigger();
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_seen_by_late_subscriber() {
        let shutdown = Shutdown::new();
        let mut early = shutdown.subscribe();
        assert!(!shutdown.is_triggered());

        shutdown.trigger();
        let mut late = shutdown.subscribe();

        assert!(*early.wait_for(|stop| *stop).await.unwrap());
        assert!(*late.wait_for(|stop| *stop).await.unwrap());
        assert!(shutdown.is_triggered());
    }
}
