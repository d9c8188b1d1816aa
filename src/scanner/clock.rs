//! Pauses and interruption for the scan loop
//!
//! The loop never calls `tokio::time::sleep` directly. It sleeps through a
//! [`Clock`], so tests can observe requested durations without waiting, and
//! it races every pause and request against an [`Interrupt`].

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Something the scan loop can sleep on
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock sleeping backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Creates a connected interrupt trigger/listener pair
pub fn interrupt_channel() -> (InterruptHandle, Interrupt) {
    let (tx, rx) = watch::channel(false);
    (InterruptHandle { tx }, Interrupt { rx })
}

/// Sending side of an interrupt, held by whoever listens for Ctrl-C
#[derive(Debug)]
pub struct InterruptHandle {
    tx: watch::Sender<bool>,
}

impl InterruptHandle {
    /// Requests that the running scan stop
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Re-arms the interrupt before a new scan invocation
    pub fn reset(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Receiving side of an interrupt, polled by the scan loop
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// An interrupt that never fires
    pub fn never() -> Self {
        let (_, interrupt) = interrupt_channel();
        interrupt
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the interrupt has been triggered
    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Sender gone without triggering: nothing can fire anymore
                std::future::pending::<()>().await;
            }
        }
    }

    /// Runs `future` unless the interrupt fires first
    ///
    /// Returns `None` when interrupted; the future is dropped at that point.
    pub async fn guard<F: Future>(&mut self, future: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.triggered() => None,
            output = future => Some(output),
        }
    }
}
