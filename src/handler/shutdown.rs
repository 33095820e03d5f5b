use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::info;

/// Cloneable one-shot shutdown notification.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    signal: Arc<Notify>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self { Self::default() }

    pub fn shutdown(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        self.signal.notify_waiters();
    }

    pub fn is_shutdown(&self) -> bool { self.triggered.load(Ordering::SeqCst) }

    /// Resolves once `shutdown` has been called, including calls made before waiting.
    pub async fn wait_for_shutdown(&self) {
        let notified = self.signal.notified();
        if self.is_shutdown() {
            return;
        }
        notified.await;
    }

    /// Triggers the signal on Ctrl-C.
    pub fn listen_for_ctrl_c(&self) -> tokio::task::JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("termination_signal::graceful_shutdown");
                signal.shutdown();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_waiters_are_released() {
        let signal = ShutdownSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.wait_for_shutdown().await })
        };
        tokio::task::yield_now().await;
        signal.shutdown();
        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_late_waiter_returns_immediately() {
        let signal = ShutdownSignal::new();
        signal.shutdown();
        assert!(signal.is_shutdown());
        tokio::time::timeout(Duration::from_millis(100), signal.wait_for_shutdown())
            .await
            .unwrap();
    }
}
