//! Timer plumbing shared by the polling views.

use log::debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

pub(crate) const DASHBOARD_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub(crate) const DETAIL_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub(crate) const LOG_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Async sleep abstraction for polling tests.
pub(crate) trait Sleeper: Send + Sync {
    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Tokio-backed sleeper used in production.
pub(crate) struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Owned handle to a background task started by a view.
///
/// The task is aborted exactly once, either by [`PollHandle::stop`] or on drop.
pub(crate) struct PollHandle {
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Spawn `future` on the runtime and take ownership of it.
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            task: Some(tokio::spawn(future)),
        }
    }

    /// Release the task.
    pub(crate) fn stop(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("background task released");
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Send `tick` into `events` every `period` until the receiver goes away.
///
/// A tick is dropped while the channel is still full, so a slow consumer sees
/// at most `capacity` pending ticks rather than a backlog.
pub(crate) fn spawn_ticker<S, E>(
    sleeper: Arc<S>,
    period: Duration,
    events: mpsc::Sender<E>,
    tick: E,
) -> PollHandle
where
    S: Sleeper + 'static,
    E: Clone + Send + 'static,
{
    PollHandle::spawn(async move {
        loop {
            sleeper.sleep(period).await;
            match events.try_send(tick.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => debug!("previous tick still pending, skipping"),
                Err(TrySendError::Closed(_)) => {
                    debug!("ticker receiver closed");
                    break;
                }
            }
        }
    })
}
