// src/pipeline/shutdown.rs

//! Shutdown signalling between the process and the scheduler.

use tokio::sync::watch;

/// Handle used to request shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiving side, checked by the scheduler between sources and while idle.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Create a linked trigger and listener.
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    /// A listener that never fires.
    pub fn never() -> Shutdown {
        Self::channel().1
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested. Pends forever if the trigger is
    /// dropped without firing.
    pub async fn wait(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_trigger_is_observed() {
        let (trigger, mut shutdown) = Shutdown::channel();
        assert!(!shutdown.is_triggered());
        trigger.trigger();
        assert!(shutdown.is_triggered());
        tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_trigger_never_fires() {
        let (trigger, mut shutdown) = Shutdown::channel();
        drop(trigger);
        let waited = tokio::time::timeout(Duration::from_secs(5), shutdown.wait()).await;
        assert!(waited.is_err());
        assert!(!shutdown.is_triggered());
    }
}
