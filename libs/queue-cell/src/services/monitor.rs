use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Days, Local, NaiveDate};
use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{LiveQueueEntry, QueueView};
use crate::services::poller::QueuePoller;
use crate::services::token::TokenService;

type QueueKey = (i64, NaiveDate);

/// Bounds on what anonymous callers can make the monitor poll.
#[derive(Debug, Clone, Copy)]
pub struct QueueLimits {
    pub idle_timeout: Duration,
    pub max_watched: usize,
    pub days_ahead: u64,
}

impl QueueLimits {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            idle_timeout: config.queue_idle_timeout(),
            max_watched: config.queue_max_watched.max(1),
            days_ahead: config.queue_days_ahead,
        }
    }
}

impl Default for QueueLimits {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

struct WatchedQueue {
    poller: QueuePoller<Vec<LiveQueueEntry>>,
    last_viewed: Instant,
}

/// Shared live-queue pollers, one per doctor and date, started on first
/// request. A poller is dropped once its date has passed or nobody has
/// viewed it for `idle_timeout`.
pub struct QueueMonitor {
    tokens: Arc<TokenService>,
    interval: Duration,
    first_poll_timeout: Duration,
    limits: QueueLimits,
    pollers: Mutex<HashMap<QueueKey, WatchedQueue>>,
}

impl QueueMonitor {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_service(
            Arc::new(TokenService::new(config)),
            config.queue_poll_interval(),
            config.request_timeout(),
        )
        .with_limits(QueueLimits::from_config(config))
    }

    pub fn with_service(tokens: Arc<TokenService>, interval: Duration, first_poll_timeout: Duration) -> Self {
        Self {
            tokens,
            interval,
            first_poll_timeout,
            limits: QueueLimits::default(),
            pollers: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_limits(mut self, limits: QueueLimits) -> Self {
        self.limits = limits;
        self
    }

    fn spawn_poller(&self, doctor_id: i64, date: NaiveDate) -> QueuePoller<Vec<LiveQueueEntry>> {
        let tokens = self.tokens.clone();
        QueuePoller::spawn(format!("queue-{}-{}", doctor_id, date), self.interval, move || {
            let tokens = tokens.clone();
            async move { tokens.live_queue(doctor_id, date).await }
        })
    }

    fn retain_live(&self, pollers: &mut HashMap<QueueKey, WatchedQueue>, today: NaiveDate) -> usize {
        let before = pollers.len();
        let idle_timeout = self.limits.idle_timeout;
        pollers.retain(|(_, date), watched| *date >= today && watched.last_viewed.elapsed() < idle_timeout);
        before - pollers.len()
    }

    /// Latest known queue. The first request for a queue waits for its first
    /// poll, bounded by the request timeout.
    pub async fn view(&self, doctor_id: i64, date: NaiveDate, today: NaiveDate) -> Result<QueueView, AppError> {
        if date < today {
            return Err(AppError::BadRequest("Live queues are only kept for today and later.".to_string()));
        }
        let horizon = today.checked_add_days(Days::new(self.limits.days_ahead)).unwrap_or(NaiveDate::MAX);
        if date > horizon {
            return Err(AppError::BadRequest(format!(
                "Live queues are only available up to {} days ahead.",
                self.limits.days_ahead
            )));
        }

        let mut updates = {
            let mut pollers = self.pollers.lock().await;

            let dropped = self.retain_live(&mut pollers, today);
            if dropped > 0 {
                debug!("Dropped {} stale queue pollers", dropped);
            }

            let key = (doctor_id, date);
            if !pollers.contains_key(&key) && pollers.len() >= self.limits.max_watched {
                warn!("Refusing queue {} on {}: {} queues already watched", doctor_id, date, pollers.len());
                return Err(AppError::Unavailable(
                    "Too many live queues are being watched. Try again shortly.".to_string(),
                ));
            }

            let watched = pollers.entry(key).or_insert_with(|| WatchedQueue {
                poller: self.spawn_poller(doctor_id, date),
                last_viewed: Instant::now(),
            });
            watched.last_viewed = Instant::now();
            watched.poller.subscribe()
        };

        let polled = updates.borrow().polls > 0;
        if !polled {
            let _ = tokio::time::timeout(self.first_poll_timeout, updates.changed()).await;
        }

        let snapshot = updates.borrow().clone();
        Ok(QueueView {
            doctor_id,
            date,
            entries: snapshot.value.unwrap_or_default(),
            updated_at: snapshot.updated_at,
            last_error: snapshot.last_error,
        })
    }

    /// Drops pollers for past dates and pollers nobody is viewing.
    pub async fn prune(&self, today: NaiveDate) -> usize {
        let mut pollers = self.pollers.lock().await;
        self.retain_live(&mut pollers, today)
    }

    /// Background task pruning idle pollers even when no new views arrive.
    pub fn spawn_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        let every = (monitor.limits.idle_timeout / 2).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut cleanup_interval = interval(every);
            loop {
                cleanup_interval.tick().await;

                let dropped = monitor.prune(Local::now().date_naive()).await;
                if dropped > 0 {
                    info!("Stopped {} idle queue pollers", dropped);
                }
            }
        })
    }

    pub async fn watched(&self) -> usize {
        self.pollers.lock().await.len()
    }

    /// Stops every poller and waits for them to finish.
    pub async fn stop_all(&self) {
        let pollers: Vec<_> = self.pollers.lock().await.drain().map(|(_, watched)| watched.poller).collect();
        let count = pollers.len();

        join_all(pollers.into_iter().map(QueuePoller::stop)).await;
        info!("Stopped {} queue pollers", count);
    }
}
