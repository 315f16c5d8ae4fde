//! Execution signal: is an external run/build in progress?
//!
//! A single boolean broadcast over a `watch` channel. Any component can set
//! it and any component can observe it; run controls stay disabled while it
//! is true. Nothing is persisted.

use std::sync::{Arc, OnceLock};

use tokio::sync::watch;

/// Cloneable handle to a running/not-running flag.
#[derive(Clone, Debug)]
pub struct ExecutionSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ExecutionSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionSignal {
    /// A fresh, independent signal, initially not running.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// The process-wide signal.
    pub fn global() -> &'static ExecutionSignal {
        static GLOBAL: OnceLock<ExecutionSignal> = OnceLock::new();
        GLOBAL.get_or_init(ExecutionSignal::new)
    }

    /// Set the flag. Subscribers are only woken when the value changes.
    pub fn set_running(&self, running: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == running {
                false
            } else {
                *current = running;
                true
            }
        });
        if changed {
            tracing::debug!(running, "execution signal changed");
        }
    }

    pub fn is_running(&self) -> bool {
        *self.tx.borrow()
    }

    /// Observe the flag reactively.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Mark a run as started; it ends when the guard is dropped.
    pub fn begin(&self) -> RunGuard {
        self.set_running(true);
        RunGuard {
            signal: self.clone(),
        }
    }
}

/// Resets the signal to not running when dropped.
#[must_use = "the run ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct RunGuard {
    signal: ExecutionSignal,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.signal.set_running(false);
    }
}
