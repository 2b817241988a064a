//! Cancellable background tasks.
//!
//! A [`TaskHandle`] owns the shutdown signal of one spawned loop. Stopping
//! (or dropping) the handle wakes the loop's [`Shutdown`] future; the loop is
//! expected to select on it so no new iteration starts afterwards.

use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::ServiceUnavailableError;

/// Receiving side of a task's shutdown signal.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once stop was requested or the handle was dropped.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Handle to a spawned background loop.
pub struct TaskHandle {
    name: &'static str,
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Spawn `f` on the current tokio runtime.
    ///
    /// # Errors
    /// Fails when called outside a runtime.
    pub fn spawn<F, Fut>(name: &'static str, f: F) -> Result<Self, ServiceUnavailableError>
    where
        F: FnOnce(Shutdown) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ServiceUnavailableError::NoRuntime { task: name })?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = runtime.spawn(f(Shutdown { rx: shutdown_rx }));
        debug!(task = name, "Task spawned");
        Ok(Self {
            name,
            shutdown_tx,
            join,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Still looping and not asked to stop.
    pub fn is_running(&self) -> bool {
        !self.join.is_finished() && !*self.shutdown_tx.borrow()
    }

    /// Signal shutdown and return immediately. An in-flight iteration may
    /// finish or be abandoned.
    pub fn stop(&self) {
        debug!(task = self.name, "Task stop requested");
        let _ = self.shutdown_tx.send(true);
    }

    /// Signal shutdown and wait for the loop to exit.
    pub async fn stop_and_wait(self) {
        self.stop();
        let _ = self.join.await;
    }
}
