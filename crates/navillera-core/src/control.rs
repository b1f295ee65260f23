//! Run control for cancellation: a shared cancel flag plus a wakeup for
//! tasks that are waiting on a running tool process.
//!
//! The dispatcher checks the flag before starting each batch. An in-flight
//! invocation waits on [`RunControl::cancelled`] alongside the process exit
//! and terminates the child when it fires. A control client (e.g.
//! `navillera stop` via socket) or a Ctrl-C handler calls [`RunControl::cancel`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Shared cancellation state for one run.
#[derive(Debug, Default)]
pub struct RunControl {
    cancelled: AtomicBool,
    notify: Notify,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; wakes every task waiting in `cancelled()`.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called (immediately if it already was).
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel() is not missed.
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Default path for the control socket (XDG state dir, next to the log).
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("navillera")?.get_state_home();
    Ok(dir.join("navillera").join("control.sock"))
}
