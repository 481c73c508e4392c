//! One-shot waiters settled by an event's next admitted dispatch.

use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{WaitError, WaitResult};
use crate::node::Event;

/// Pending waiters of one event, oldest first.
#[derive(Debug, Default)]
pub(crate) struct WaiterRegistry {
    pending: Vec<oneshot::Sender<Vec<Value>>>,
}

impl WaiterRegistry {
    pub(crate) fn register(&mut self) -> oneshot::Receiver<Vec<Value>> {
        self.prune();
        let (sender, receiver) = oneshot::channel();
        self.pending.push(sender);
        receiver
    }

    /// Drop waiters whose future was abandoned (timed out or dropped).
    pub(crate) fn prune(&mut self) {
        self.pending.retain(|sender| !sender.is_closed());
    }

    pub(crate) fn take(&mut self) -> Vec<oneshot::Sender<Vec<Value>>> {
        std::mem::take(&mut self.pending)
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.iter().filter(|s| !s.is_closed()).count()
    }
}

/// Resolve every taken waiter with `args`, newest first.
///
/// Returns how many were still listening.
pub(crate) fn settle(waiters: Vec<oneshot::Sender<Vec<Value>>>, args: &[Value]) -> usize {
    let mut settled: usize = 0;
    for sender in waiters.into_iter().rev() {
        if sender.send(args.to_vec()).is_ok() {
            settled = settled.saturating_add(1);
        }
    }
    settled
}

fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

impl Event {
    /// Wait for the next admitted dispatch of this event and return its
    /// arguments.
    ///
    /// The waiter is registered when this method is called, so a dispatch
    /// that happens before the future is first polled still resolves it.
    ///
    /// # Errors
    ///
    /// - [`WaitError::TimedOut`] if `timeout` elapses first.
    /// - [`WaitError::Closed`] if the event is dropped first.
    ///
    /// # Panics
    ///
    /// Awaiting with a timeout outside a Tokio runtime with the time driver
    /// enabled panics.
    pub fn wait(
        &self,
        timeout: Option<Duration>,
    ) -> impl Future<Output = WaitResult<Vec<Value>>> + Send + 'static {
        let receiver = self.write().waiters.register();
        let event = self.id();
        trace!(%event, ?timeout, "Waiter registered");

        async move {
            let Some(limit) = timeout else {
                return receiver.await.map_err(|_| WaitError::Closed);
            };
            match tokio::time::timeout(limit, receiver).await {
                Ok(Ok(args)) => Ok(args),
                Ok(Err(_)) => Err(WaitError::Closed),
                Err(_) => {
                    trace!(%event, "Waiter timed out");
                    Err(WaitError::TimedOut {
                        timeout_ms: timeout_millis(limit),
                    })
                },
            }
        }
    }

    /// [`wait`](Self::wait) with a timeout in seconds.
    ///
    /// Zero, negative and NaN values time out immediately; values too large
    /// for a [`Duration`] (including infinity) never time out.
    pub fn wait_secs(
        &self,
        seconds: f64,
    ) -> impl Future<Output = WaitResult<Vec<Value>>> + Send + 'static {
        let timeout = if seconds.is_nan() || seconds <= 0.0 {
            Some(Duration::ZERO)
        } else {
            Duration::try_from_secs_f64(seconds).ok()
        };
        self.wait(timeout)
    }

    /// [`wait`](Self::wait) with the configured default timeout.
    #[cfg(feature = "config")]
    pub fn wait_with(
        &self,
        waiters: &ripple_config::WaitersSection,
    ) -> impl Future<Output = WaitResult<Vec<Value>>> + Send + 'static {
        self.wait(waiters.default_timeout())
    }

    /// Number of waiters still listening.
    #[must_use]
    pub fn pending_waiters(&self) -> usize {
        self.read().waiters.len()
    }
}
