use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use shared_api_client::ClinicApiError;

/// Latest state of a polled read. A successful poll replaces `value`; a
/// failed one only records `last_error`, so the last good value stays visible.
#[derive(Debug, Clone)]
pub struct PollSnapshot<T> {
    pub value: Option<T>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub polls: u64,
}

impl<T> Default for PollSnapshot<T> {
    fn default() -> Self {
        Self {
            value: None,
            updated_at: None,
            last_error: None,
            polls: 0,
        }
    }
}

/// A fixed-interval poll loop running on its own task.
///
/// Polls never overlap: each tick awaits its fetch before the next tick is
/// considered, and ticks missed meanwhile are skipped. [`stop`](Self::stop)
/// cancels an in-flight fetch and waits for the task to finish; dropping the
/// poller aborts the task.
pub struct QueuePoller<T> {
    name: String,
    shutdown: watch::Sender<bool>,
    updates: watch::Sender<PollSnapshot<T>>,
    handle: Option<JoinHandle<()>>,
}

impl<T> QueuePoller<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn spawn<F, Fut>(name: impl Into<String>, interval: Duration, mut fetch: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ClinicApiError>> + Send + 'static,
    {
        let name = name.into();
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let (updates, _) = watch::channel(PollSnapshot::default());

        let task_updates = updates.clone();
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!("Poller {} started ({:?} interval)", task_name, interval);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {}
                }

                let result = tokio::select! {
                    _ = shutdown_rx.changed() => {
                        debug!("Poller {} cancelled an in-flight fetch", task_name);
                        break;
                    }
                    result = fetch() => result,
                };

                task_updates.send_modify(|snapshot| {
                    snapshot.polls += 1;
                    match result {
                        Ok(value) => {
                            snapshot.value = Some(value);
                            snapshot.updated_at = Some(Utc::now());
                            snapshot.last_error = None;
                        }
                        Err(e) => {
                            warn!("Poller {} fetch failed: {}", task_name, e);
                            snapshot.last_error = Some(e.user_message());
                        }
                    }
                });
            }

            info!("Poller {} stopped", task_name);
        });

        Self {
            name,
            shutdown,
            updates,
            handle: Some(handle),
        }
    }

    pub fn latest(&self) -> PollSnapshot<T> {
        self.updates.borrow().clone()
    }

    /// Receiver notified after every completed poll.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot<T>> {
        self.updates.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |handle| !handle.is_finished())
    }

    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!("Poller {} ended abnormally: {}", self.name, e);
                }
            }
        }
    }
}

impl<T> Drop for QueuePoller<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
