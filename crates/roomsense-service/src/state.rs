//! Application state shared across handlers.
//!
//! Every piece of mutable state sits behind its own tokio lock so a slow
//! history query never blocks the poll loop from updating the session.
//! Lock order when more than one is needed: `session`, `store`, `alerts`,
//! `latest`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use roomsense_core::{AlertTracker, ProcessingSession};
use roomsense_store::Store;
use roomsense_types::{SensorResponse, SessionMeta};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;

use crate::config::Config;

/// Error text reported before the first poll completes.
pub const NO_DATA_YET: &str = "No reading received from the device yet";

/// Shared application state.
pub struct AppState {
    /// The history store.
    pub store: Mutex<Store>,
    /// Configuration.
    pub config: RwLock<Config>,
    /// The processing session for the polled device.
    pub session: Mutex<ProcessingSession>,
    /// Danger notification slot.
    pub alerts: Mutex<AlertTracker>,
    /// Envelope from the most recent poll.
    pub latest: RwLock<SensorResponse>,
    /// Collector control state.
    pub collector: CollectorState,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: Store, config: Config) -> Arc<Self> {
        Arc::new(Self {
            store: Mutex::new(store),
            config: RwLock::new(config),
            session: Mutex::new(ProcessingSession::new()),
            alerts: Mutex::new(AlertTracker::new()),
            latest: RwLock::new(SensorResponse::fallback(
                NO_DATA_YET,
                OffsetDateTime::now_utc(),
            )),
            collector: CollectorState::new(),
        })
    }

    /// Restart the session and clear the notification slot.
    ///
    /// The session guard is held until the slot is cleared, so a poll cannot
    /// land a notification for a reading the reset already discarded.
    /// Returns the number of discarded samples and the fresh session summary.
    pub async fn reset_session(&self) -> (u64, SessionMeta) {
        let mut session = self.session.lock().await;
        let discarded = session.sample_count();
        session.reset();
        self.alerts.lock().await.reset();
        (discarded, session.meta())
    }
}

/// State for tracking and controlling the collector.
pub struct CollectorState {
    /// Whether the collector is currently running.
    running: AtomicBool,
    /// When the collector was started (Unix timestamp).
    started_at: AtomicU64,
    /// Channel to signal the poll loop to stop.
    stop_tx: watch::Sender<bool>,
    /// Receiver for stop signal (cloned by the poll loop).
    stop_rx: watch::Receiver<bool>,
    /// Handle of the running poll loop.
    pub(crate) task: Mutex<Option<JoinHandle<()>>>,
    /// Poll counters.
    pub stats: RwLock<PollStats>,
}

impl CollectorState {
    /// Create a new collector state.
    pub fn new() -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            running: AtomicBool::new(false),
            started_at: AtomicU64::new(0),
            stop_tx,
            stop_rx,
            task: Mutex::new(None),
            stats: RwLock::new(PollStats::default()),
        }
    }

    /// Check if the collector is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Mark the collector as started or stopped.
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
        if running {
            let now = OffsetDateTime::now_utc().unix_timestamp() as u64;
            self.started_at.store(now, Ordering::SeqCst);
        }
    }

    /// Get the collector start time.
    pub fn started_at(&self) -> Option<OffsetDateTime> {
        let ts = self.started_at.load(Ordering::SeqCst);
        if ts == 0 {
            None
        } else {
            OffsetDateTime::from_unix_timestamp(ts as i64).ok()
        }
    }

    /// Get a receiver for the stop signal.
    pub fn subscribe_stop(&self) -> watch::Receiver<bool> {
        self.stop_rx.clone()
    }

    /// Signal the poll loop to stop.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(true);
        self.running.store(false, Ordering::SeqCst);
    }

    /// Reset the stop signal (for restarting).
    pub fn reset_stop(&self) {
        let _ = self.stop_tx.send(false);
    }

    /// Record a successful poll. Returns the failure streak it ended.
    pub async fn record_success(&self, at: OffsetDateTime) -> u32 {
        let mut stats = self.stats.write().await;
        stats.success_count += 1;
        stats.last_poll_at = Some(at);
        std::mem::take(&mut stats.consecutive_failures)
    }

    /// Record a failed poll. Returns the current failure streak.
    pub async fn record_failure(&self, at: OffsetDateTime, error: String) -> u32 {
        let mut stats = self.stats.write().await;
        stats.failure_count += 1;
        stats.consecutive_failures += 1;
        stats.last_error_at = Some(at);
        stats.last_error = Some(error);
        stats.consecutive_failures
    }
}

impl Default for CollectorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll statistics for the device.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollStats {
    /// Time of last successful poll.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_poll_at: Option<OffsetDateTime>,
    /// Time of last failed poll.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_error_at: Option<OffsetDateTime>,
    /// Last error message.
    pub last_error: Option<String>,
    /// Total successful polls.
    pub success_count: u64,
    /// Total failed polls.
    pub failure_count: u64,
    /// Failures since the last success.
    pub consecutive_failures: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomsense_core::Danger;
    use roomsense_types::RawReading;

    fn create_test_state() -> Arc<AppState> {
        AppState::new(Store::open_in_memory().unwrap(), Config::default())
    }

    #[tokio::test]
    async fn test_app_state_new() {
        let state = create_test_state();

        let config = state.config.read().await;
        assert_eq!(config.server.bind, "127.0.0.1:8080");

        let latest = state.latest.read().await;
        assert!(!latest.success);
        assert!(latest.fallback);
        assert_eq!(latest.error.as_deref(), Some(NO_DATA_YET));

        assert_eq!(state.session.lock().await.sample_count(), 0);
        assert!(state.alerts.lock().await.active().is_none());
        assert_eq!(state.store.lock().await.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reset_session_clears_alert_slot() {
        let state = create_test_state();
        let now = OffsetDateTime::now_utc();
        let smoky = RawReading::new(None, 100).with_gas_smoke(true);

        state.session.lock().await.process(&smoky);
        state
            .alerts
            .lock()
            .await
            .observe(Danger::evaluate(&smoky), now);

        let (discarded, meta) = state.reset_session().await;
        assert_eq!(discarded, 1);
        assert_eq!(meta.sample_count, 0);
        assert!(state.alerts.lock().await.active().is_none());
        assert_eq!(state.session.lock().await.sample_count(), 0);
    }

    #[test]
    fn test_collector_state() {
        let collector = CollectorState::new();
        assert!(!collector.is_running());
        assert!(collector.started_at().is_none());

        collector.set_running(true);
        assert!(collector.is_running());
        assert!(collector.started_at().is_some());

        collector.signal_stop();
        assert!(!collector.is_running());
    }

    #[test]
    fn test_stop_signal_reaches_subscribers() {
        let collector = CollectorState::new();
        let rx = collector.subscribe_stop();
        assert!(!*rx.borrow());

        collector.signal_stop();
        assert!(*rx.borrow());

        collector.reset_stop();
        assert!(!*rx.borrow());
    }

    #[tokio::test]
    async fn test_poll_stats_streaks() {
        let collector = CollectorState::new();
        let now = OffsetDateTime::now_utc();

        assert_eq!(collector.record_failure(now, "timeout".into()).await, 1);
        assert_eq!(collector.record_failure(now, "timeout".into()).await, 2);
        assert_eq!(collector.record_success(now).await, 2);
        assert_eq!(collector.record_failure(now, "refused".into()).await, 1);

        let stats = collector.stats.read().await;
        assert_eq!(stats.success_count, 1);
        assert_eq!(stats.failure_count, 3);
        assert_eq!(stats.consecutive_failures, 1);
        assert_eq!(stats.last_error.as_deref(), Some("refused"));
        assert_eq!(stats.last_poll_at, Some(now));
    }
}
