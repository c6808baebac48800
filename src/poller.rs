use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{watch, Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::aggregator::Aggregator;
use crate::article::NewsArticle;
use crate::display::{self, DisplayItem};

/// Where the poller gets raw articles from.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_news(&self) -> anyhow::Result<Vec<NewsArticle>>;
}

#[async_trait]
impl NewsSource for Aggregator {
    async fn fetch_news(&self) -> anyhow::Result<Vec<NewsArticle>> {
        Ok(self.fetch_cyber_news().await)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollStatus {
    #[default]
    Idle,
    Loading,
}

/// Snapshot of what the feed view shows.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub items: Vec<DisplayItem>,
    pub last_updated: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub status: PollStatus,
    /// Sequence number of the poll whose result is currently shown
    applied_seq: u64,
}

/// Shortest schedule period; `tokio::time::interval` rejects zero.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct FeedPoller {
    source: Arc<dyn NewsSource>,
    fallback_link: String,
    state: RwLock<FeedState>,
    next_seq: AtomicU64,
    in_flight: AtomicUsize,
    refresh: Notify,
}

/// Counts one poll as in flight until dropped, including when the poll's
/// future is cancelled mid-fetch.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FeedPoller {
    pub fn new(source: Arc<dyn NewsSource>, fallback_link: impl Into<String>) -> Self {
        Self {
            source,
            fallback_link: fallback_link.into(),
            state: RwLock::new(FeedState::default()),
            next_seq: AtomicU64::new(1),
            in_flight: AtomicUsize::new(0),
            refresh: Notify::new(),
        }
    }

    pub async fn snapshot(&self) -> FeedState {
        let mut state = self.state.read().await.clone();
        state.status = self.status();
        state
    }

    /// Loading while any poll is in flight.
    pub fn status(&self) -> PollStatus {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            PollStatus::Loading
        } else {
            PollStatus::Idle
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status() == PollStatus::Loading
    }

    /// Wake the polling task so it fetches without waiting for the next tick.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    /// Fetch once and apply the result. A result is dropped if a newer poll
    /// has already been applied.
    pub async fn poll_once(&self) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        // Declared before the state lock so the result is applied before Idle shows
        let _in_flight = InFlight::enter(&self.in_flight);

        let result = self.source.fetch_news().await;
        let now = Utc::now();
        let prepared = result.map(|articles| display::prepare(&articles, &self.fallback_link));

        let mut state = self.state.write().await;
        if seq < state.applied_seq {
            debug!("Discarding stale poll #{} (showing #{})", seq, state.applied_seq);
            return;
        }
        state.applied_seq = seq;

        match prepared {
            Ok(items) => {
                info!("Feed updated with {} items", items.len());
                state.items = items;
                state.last_updated = Some(now);
                state.error = None;
            }
            Err(e) => {
                warn!("Feed fetch failed: {}", e);
                state.error = Some("Unable to load the latest threat news right now.".to_string());
            }
        }
    }

    /// Start polling: once immediately, then every `interval` (at least
    /// [`MIN_POLL_INTERVAL`]).
    pub fn start(self: &Arc<Self>, interval: Duration) -> PollerTask {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let poller = Arc::clone(self);
        let handle = tokio::spawn(async move {
            poller.run(interval, shutdown_rx).await;
        });

        PollerTask {
            shutdown: shutdown_tx,
            handle: Some(handle),
        }
    }

    async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!("Feed poller started, interval {}s", interval.as_secs());
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Feed poller stopped");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    debug!("Scheduled feed poll");
                    self.poll_once().await;
                }
                _ = self.refresh.notified() => {
                    debug!("Manual feed refresh");
                    self.poll_once().await;
                }
            }
        }
    }
}

/// Owns the polling task; stopping or dropping it cancels the schedule.
pub struct PollerTask {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl PollerTask {
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for PollerTask {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
