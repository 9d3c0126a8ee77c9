//! Cancellable scheduled hide for the tokio runtime.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Holds at most one pending hide task, keyed by notification id.
///
/// Scheduling a new task or cancelling aborts the previous one, so an old
/// deadline never fires after it has been superseded.
#[derive(Debug, Default)]
pub struct DismissTimer {
    pending: Option<(u64, JoinHandle<()>)>,
}

impl DismissTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `on_fire` after `delay` unless cancelled or replaced first.
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&mut self, id: u64, delay: Duration, on_fire: F)
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire(id).await;
        });
        debug!(id, delay_ms = delay.as_millis() as u64, "hide scheduled");
        self.pending = Some((id, handle));
    }

    /// Abort the pending task. Returns the id it was scheduled for.
    pub fn cancel(&mut self) -> Option<u64> {
        let (id, handle) = self.pending.take()?;
        handle.abort();
        debug!(id, "hide cancelled");
        Some(id)
    }

    /// Id of the pending task, if it has not finished yet.
    pub fn pending_id(&self) -> Option<u64> {
        match &self.pending {
            Some((id, handle)) if !handle.is_finished() => Some(*id),
            _ => None,
        }
    }
}

impl Drop for DismissTimer {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.pending.take() {
            handle.abort();
        }
    }
}
