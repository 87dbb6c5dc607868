//! Background status polling
//!
//! The poller owns one ticking task. Each tick launches a poll as its own
//! task, but only when no poll is in flight: a busy tick is dropped, never
//! queued. Results are published on a `watch` channel. A failed poll keeps
//! the previous snapshot and marks the view as stalled.
//!
//! A restart while a stopped poll is still running defers its first poll
//! until that one returns, so two queries never overlap.

use crate::client::FleetClient;
use crate::error::{ErrorKind, FleetError};
use crate::invoker::ManagerBackend;
use crate::model::FleetSnapshot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Anything that can produce a fleet snapshot
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    async fn fetch_status(&self) -> Result<FleetSnapshot, FleetError>;
}

#[async_trait]
impl<B: ManagerBackend + 'static> StatusSource for FleetClient<B> {
    async fn fetch_status(&self) -> Result<FleetSnapshot, FleetError> {
        FleetClient::fetch_status(self).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Created, never started
    Idle,
    /// A query is in flight
    Polling,
    /// Last query succeeded
    Updated,
    /// Last query failed; the previous snapshot is still published
    Stalled,
    Stopped,
}

/// What consumers observe
#[derive(Debug, Clone)]
pub struct PollerView {
    /// Latest successful snapshot. Never cleared by a failed poll.
    pub snapshot: Option<Arc<FleetSnapshot>>,
    pub state: PollState,
    /// Set on the first failure after a success, cleared on the next success
    pub stalled_since: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_error_kind: Option<ErrorKind>,
    pub last_success: Option<DateTime<Utc>>,
}

impl PollerView {
    fn idle() -> Self {
        Self {
            snapshot: None,
            state: PollState::Idle,
            stalled_since: None,
            consecutive_failures: 0,
            last_error: None,
            last_error_kind: None,
            last_success: None,
        }
    }

    /// The stall indicator. Stays set while a retry is in flight.
    pub fn is_stalled(&self) -> bool {
        self.stalled_since.is_some()
    }

    /// Stalled for at least `threshold` as of `now`. Consumers use this to
    /// label the displayed snapshot as stale; the snapshot itself is kept.
    pub fn is_stale(&self, threshold: Duration, now: DateTime<Utc>) -> bool {
        match self.stalled_since {
            Some(since) => (now - since).to_std().map(|d| d >= threshold).unwrap_or(false),
            None => false,
        }
    }
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollerStats {
    pub polls_started: u64,
    pub ticks_skipped: u64,
}

struct Shared<S> {
    source: Arc<S>,
    busy: Arc<AtomicBool>,
    running: AtomicBool,
    /// Bumped on every start/stop; results from an older generation are dropped
    generation: AtomicU64,
    /// Generation whose immediate poll waits for the in-flight one (0 = none)
    pending: AtomicU64,
    view_tx: watch::Sender<PollerView>,
    polls_started: AtomicU64,
    ticks_skipped: AtomicU64,
}

/// Clears the busy flag when the poll task ends, even on panic
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: StatusSource> Shared<S> {
    /// Launch a poll unless one is already in flight.
    fn try_launch(self: &Arc<Self>, generation: u64) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
            debug!("Previous status poll still in flight, skipping tick");
            return false;
        }
        let guard = BusyGuard(Arc::clone(&self.busy));

        self.polls_started.fetch_add(1, Ordering::Relaxed);
        self.view_tx.send_if_modified(|view| {
            if self.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            view.state = PollState::Polling;
            true
        });

        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let result = shared.source.fetch_status().await;
            shared.publish(generation, result);
            drop(guard);
            shared.launch_pending();
        });
        true
    }

    /// Launch now, or hand the launch to the poll currently in flight.
    fn launch_or_defer(self: &Arc<Self>, generation: u64) {
        // recorded before the attempt so a poll finishing in between sees it
        self.pending.store(generation, Ordering::SeqCst);
        if self.try_launch(generation) {
            let _ = self
                .pending
                .compare_exchange(generation, 0, Ordering::SeqCst, Ordering::SeqCst);
        } else {
            debug!("Deferring first poll until the previous one finishes");
        }
    }

    fn launch_pending(self: &Arc<Self>) {
        let generation = self.pending.swap(0, Ordering::SeqCst);
        if generation != 0
            && self.running.load(Ordering::Acquire)
            && self.generation.load(Ordering::Acquire) == generation
        {
            self.try_launch(generation);
        }
    }

    fn publish(&self, generation: u64, result: Result<FleetSnapshot, FleetError>) {
        let now = Utc::now();
        let accepted = self.view_tx.send_if_modified(|view| {
            // checked under the channel lock so a concurrent stop() wins
            if self.generation.load(Ordering::Acquire) != generation {
                return false;
            }
            match &result {
                Ok(snapshot) => {
                    view.snapshot = Some(Arc::new(snapshot.clone()));
                    view.state = PollState::Updated;
                    view.stalled_since = None;
                    view.consecutive_failures = 0;
                    view.last_error = None;
                    view.last_error_kind = None;
                    view.last_success = Some(now);
                }
                Err(e) => {
                    view.state = PollState::Stalled;
                    view.stalled_since.get_or_insert(now);
                    view.consecutive_failures = view.consecutive_failures.saturating_add(1);
                    view.last_error = Some(e.to_string());
                    view.last_error_kind = Some(e.kind());
                }
            }
            true
        });

        match (&result, accepted) {
            (_, false) => debug!("Discarding status poll result after stop"),
            (Ok(snapshot), true) => debug!(entries = snapshot.len(), "Published fleet snapshot"),
            (Err(e), true) => warn!(
                error = %e,
                kind = ?e.kind(),
                "Status poll failed, keeping previous snapshot"
            ),
        }
    }
}

/// Owned polling task with a start/stop lifecycle.
///
/// `start` and `refresh` spawn onto the current tokio runtime.
pub struct StatusPoller<S: StatusSource> {
    shared: Arc<Shared<S>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl<S: StatusSource> StatusPoller<S> {
    pub fn new(source: Arc<S>) -> Self {
        let (view_tx, _) = watch::channel(PollerView::idle());
        Self {
            shared: Arc::new(Shared {
                source,
                busy: Arc::new(AtomicBool::new(false)),
                running: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                pending: AtomicU64::new(0),
                view_tx,
                polls_started: AtomicU64::new(0),
                ticks_skipped: AtomicU64::new(0),
            }),
            ticker: Mutex::new(None),
        }
    }

    /// Poll immediately, then every `interval`. Restarts the ticker when
    /// already running.
    pub fn start(&self, interval: Duration) {
        let interval = interval.max(Duration::from_millis(1));
        let mut ticker = self.ticker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = ticker.take() {
            handle.abort();
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.shared.running.store(true, Ordering::Release);
        self.shared
            .view_tx
            .send_modify(|view| view.state = PollState::Polling);
        info!(?interval, "Starting status poller");

        self.shared.launch_or_defer(generation);

        let shared = Arc::clone(&self.shared);
        *ticker = Some(tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + interval, interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                shared.try_launch(generation);
            }
        }));
    }

    /// Cancel the ticker. An in-flight poll finishes but its result is dropped.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::Release);
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        self.shared.pending.store(0, Ordering::SeqCst);
        if let Some(handle) = self
            .ticker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }
        self.shared
            .view_tx
            .send_modify(|view| view.state = PollState::Stopped);
        info!("Status poller stopped");
    }

    /// Out-of-band poll (e.g. after a start/stop). Follows the same
    /// one-in-flight rule; returns whether a poll was launched.
    pub fn refresh(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        let generation = self.shared.generation.load(Ordering::Acquire);
        self.shared.try_launch(generation)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Receiver that wakes on every published view change
    pub fn subscribe(&self) -> watch::Receiver<PollerView> {
        self.shared.view_tx.subscribe()
    }

    pub fn current(&self) -> PollerView {
        self.shared.view_tx.borrow().clone()
    }

    /// Latest successful snapshot, shared rather than copied
    pub fn snapshot(&self) -> Option<Arc<FleetSnapshot>> {
        self.shared.view_tx.borrow().snapshot.clone()
    }

    pub fn stats(&self) -> PollerStats {
        PollerStats {
            polls_started: self.shared.polls_started.load(Ordering::Relaxed),
            ticks_skipped: self.shared.ticks_skipped.load(Ordering::Relaxed),
        }
    }
}

impl<S: StatusSource> Drop for StatusPoller<S> {
    fn drop(&mut self) {
        if let Some(handle) = self
            .ticker
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }
    }
}
