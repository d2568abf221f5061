//! Process lifecycle shared by the scheduler loops and the orchestrator.
//!
//! Two independent paths leave the main control flow:
//!
//! - a graceful shutdown, requested at most once and propagated to every
//!   task holding a child token;
//! - a fatal escalation, delivered on its own channel so the main flow can
//!   terminate the process without going through the shutdown path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::app::AppError;

#[derive(Clone)]
pub struct Lifecycle {
    token: CancellationToken,
    shutdown_sent: Arc<AtomicBool>,
    failed: CancellationToken,
    fatal_tx: mpsc::UnboundedSender<AppError>,
}

/// Receiving end of fatal escalations, owned by the main control flow.
pub struct FatalReceiver {
    rx: mpsc::UnboundedReceiver<AppError>,
}

impl FatalReceiver {
    pub async fn recv(&mut self) -> Option<AppError> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<AppError> {
        self.rx.try_recv().ok()
    }
}

impl Lifecycle {
    pub fn new() -> (Self, FatalReceiver) {
        let (fatal_tx, rx) = mpsc::unbounded_channel();
        let lifecycle = Self {
            token: CancellationToken::new(),
            shutdown_sent: Arc::new(AtomicBool::new(false)),
            failed: CancellationToken::new(),
            fatal_tx,
        };
        (lifecycle, FatalReceiver { rx })
    }

    /// Token for a task that must stop when shutdown is requested.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Request shutdown. Returns `true` only for the call that sent it.
    pub fn request_shutdown(&self, reason: &str) -> bool {
        if self.shutdown_sent.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!("Shutdown requested: {}", reason);
        self.token.cancel();
        true
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn shutdown_requested(&self) {
        self.token.cancelled().await
    }

    /// Whether a fatal error has been escalated. Work still in flight should
    /// stop without producing further side effects.
    pub fn has_failed(&self) -> bool {
        self.failed.is_cancelled()
    }

    pub async fn failure_escalated(&self) {
        self.failed.cancelled().await
    }

    /// Hand an unrecoverable error to the main control flow.
    pub fn escalate_fatal(&self, err: AppError) {
        error!("Fatal error: {}", err);
        self.failed.cancel();
        if self.fatal_tx.send(err).is_err() {
            error!("Fatal error receiver is gone");
        }
    }
}
