//! Ctrl+C routing.
//!
//! The process has one SIGINT listener (installed by `main`). While some
//! work holds an [`InterruptGuard`] the signal is handed to that work;
//! otherwise the listener ends the process.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Interrupts {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    /// Number of interrupts delivered to guarded work so far.
    count: watch::Sender<u64>,
    guards: AtomicUsize,
}

impl Default for Interrupts {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                count: watch::channel(0).0,
                guards: AtomicUsize::new(0),
            }),
        }
    }
}

impl Interrupts {
    /// Deliver one interrupt. Returns `false` when nothing is guarded, in
    /// which case the caller decides what Ctrl+C means.
    pub fn trigger(&self) -> bool {
        if self.inner.guards.load(Ordering::SeqCst) == 0 {
            return false;
        }
        self.inner.count.send_modify(|n| *n += 1);
        true
    }

    /// Claim interrupts until the guard is dropped. Only interrupts that
    /// arrive after this call are seen by the guard.
    pub fn guard(&self) -> InterruptGuard {
        self.inner.guards.fetch_add(1, Ordering::SeqCst);
        let rx = self.inner.count.subscribe();
        let seen = *rx.borrow();
        InterruptGuard {
            interrupts: self.clone(),
            rx,
            seen,
        }
    }

    pub fn is_guarded(&self) -> bool {
        self.inner.guards.load(Ordering::SeqCst) > 0
    }
}

pub struct InterruptGuard {
    interrupts: Interrupts,
    rx: watch::Receiver<u64>,
    seen: u64,
}

impl InterruptGuard {
    /// Resolves on the next interrupt. Cancel safe, so it can sit in a
    /// `tokio::select!` next to the work it interrupts.
    pub async fn interrupted(&mut self) {
        let seen = self.seen;
        match self.rx.wait_for(|n| *n > seen).await {
            Ok(n) => self.seen = *n,
            // The sender lives as long as `self.interrupts`.
            Err(_) => std::future::pending().await,
        }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.interrupts.inner.guards.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Forward SIGINT to `interrupts` for the life of the process. Returns when
/// an interrupt arrives with nothing guarding it.
pub async fn forward_ctrl_c(interrupts: Interrupts) {
    while tokio::signal::ctrl_c().await.is_ok() {
        if interrupts.trigger() {
            tracing::info!("ctrl-c delivered to running operation");
        } else {
            return;
        }
    }
    // No handler could be installed; never report an interrupt.
    std::future::pending::<()>().await;
}
