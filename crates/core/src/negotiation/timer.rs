//! Cancellable delayed delivery of seller evaluations.

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

/// Owns at most one pending delayed message.
///
/// Scheduling again replaces the previous task; dropping the timer aborts it.
#[derive(Debug, Default)]
pub(crate) struct CounterpartyTimer {
    handle: Option<JoinHandle<()>>,
}

impl CounterpartyTimer {
    /// Timer with nothing scheduled.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Deliver `message` on `sender` once `delay` has elapsed.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn schedule<M>(&mut self, delay: Duration, sender: mpsc::Sender<M>, message: M)
    where
        M: Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sender.send(message).await.is_err() {
                debug!("Seller response dropped: receiver closed");
            }
        }));
    }

    /// Abort the pending delivery, if any.
    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                debug!("Pending seller response cancelled");
            }
            handle.abort();
        }
    }

    /// Whether a delivery is scheduled and has not completed yet.
    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for CounterpartyTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
