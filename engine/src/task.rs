//! Background request tasks polled from the UI loop.

use std::future::Future;

use anyhow::anyhow;
use futures_util::FutureExt;
use tokio::task::JoinHandle;

/// A spawned request whose result is picked up on a later `tick()`.
///
/// Dropping a `Pending` detaches the task; it still runs to completion but
/// its result is discarded.
#[derive(Debug)]
pub(crate) struct Pending<T> {
    label: &'static str,
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> Pending<T> {
    pub(crate) fn spawn<F>(label: &'static str, future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        tracing::debug!(task = label, "Spawning request task");
        Self {
            label,
            handle: tokio::spawn(future),
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Take the output if the task has completed, otherwise hand `self` back.
    pub(crate) fn try_complete(mut self) -> Result<anyhow::Result<T>, Self> {
        if !self.is_finished() {
            return Err(self);
        }
        // is_finished() can be true a moment before the JoinHandle is ready.
        let Some(result) = (&mut self.handle).now_or_never() else {
            return Err(self);
        };
        Ok(result.map_err(|e| anyhow!("{} task failed: {e}", self.label)))
    }
}

/// Poll `slot` and return the finished output, leaving `None` behind.
pub(crate) fn poll_slot<T: Send + 'static>(
    slot: &mut Option<Pending<T>>,
) -> Option<anyhow::Result<T>> {
    let pending = slot.take()?;
    match pending.try_complete() {
        Ok(output) => Some(output),
        Err(pending) => {
            *slot = Some(pending);
            None
        }
    }
}
