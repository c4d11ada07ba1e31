//! Background tasks tied to the lifetime of their handle.
//!
//! Every long running loop (refresh subscriptions, server monitors) is
//! spawned through [`ManagedTask`] so that dropping the owner always stops
//! the work. Tasks receive a [`CancellationToken`] and should select on it;
//! the join handle is aborted as a last resort.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Handle to a spawned background task
#[derive(Debug)]
pub struct ManagedTask {
    name: String,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ManagedTask {
    /// Spawn `f(token)` on the current runtime
    pub fn spawn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(f(cancel.clone()));
        debug!("Spawned task '{}'", name);
        Self {
            name,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signal the task to stop; does not wait
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Cancel and wait up to `timeout` for the task to exit, then abort it
    pub async fn shutdown(mut self, timeout: Duration) {
        self.cancel.cancel();
        if let Some(mut handle) = self.handle.take() {
            match tokio::time::timeout(timeout, &mut handle).await {
                Ok(_) => debug!("Task '{}' stopped", self.name),
                Err(_) => {
                    warn!("Task '{}' did not stop within {:?}, aborting", self.name, timeout);
                    handle.abort();
                }
            }
        }
    }
}

impl Drop for ManagedTask {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
