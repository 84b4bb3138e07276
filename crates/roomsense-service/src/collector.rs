//! Background data collector.
//!
//! One sequential loop polls the device on the configured interval. A slow
//! poll delays the next tick instead of overlapping it, so the session sees
//! readings strictly in order.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use roomsense_core::{Danger, DevicePoller};
use roomsense_types::{ProcessedResult, SensorResponse};

use crate::state::AppState;

/// Consecutive failures logged at `warn` before going quiet.
const NOISY_FAILURES: u32 = 3;

/// How long `stop` waits for an in-flight poll before aborting it.
const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Background collector that polls the device on its configured interval.
pub struct Collector {
    state: Arc<AppState>,
}

impl Collector {
    /// Create a new collector.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Start the poll loop.
    ///
    /// Returns `Ok(false)` if a loop is already running. Returns immediately;
    /// polling happens in the background.
    pub async fn start(&self) -> Result<bool, CollectorError> {
        let mut task = self.state.collector.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return Ok(false);
        }

        let device = self.state.config.read().await.device.clone();
        let poller = DevicePoller::new(&device.url, device.timeout())
            .map_err(CollectorError::Poller)?;

        info!(
            "Starting collector for {} (interval: {} ms, timeout: {} ms)",
            device.url, device.poll_interval_ms, device.timeout_ms
        );

        self.state.collector.reset_stop();
        self.state.collector.set_running(true);

        let state = Arc::clone(&self.state);
        let stop_rx = self.state.collector.subscribe_stop();
        *task = Some(tokio::spawn(poll_loop(
            state,
            poller,
            device.poll_interval(),
            stop_rx,
        )));

        Ok(true)
    }

    /// Stop the poll loop and wait for it to exit.
    ///
    /// Returns `false` if no loop was running.
    pub async fn stop(&self) -> bool {
        let mut task = self.state.collector.task.lock().await;
        let Some(mut handle) = task.take() else {
            return false;
        };

        self.state.collector.signal_stop();

        if tokio::time::timeout(STOP_TIMEOUT, &mut handle).await.is_err() {
            warn!("Collector did not stop within {:?}, aborting", STOP_TIMEOUT);
            handle.abort();
        }

        info!("Collector stopped");
        true
    }
}

async fn poll_loop(
    state: Arc<AppState>,
    poller: DevicePoller,
    poll_interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    debug!("Poll loop received stop signal");
                    break;
                }
                continue;
            }
        }

        match poll_once(&state, &poller).await {
            Ok(result) => {
                debug!(
                    "Polled {}: status {}, comfort {}",
                    poller.url(),
                    result.room_status,
                    result.comfort_index
                );
            }
            Err(e) => {
                let failures = state.collector.stats.read().await.consecutive_failures;
                match FailureLog::classify(&e, failures) {
                    FailureLog::Retrying => {
                        warn!("Failed to poll {}: {} (attempt {})", poller.url(), e, failures);
                    }
                    FailureLog::GivingUp => {
                        error!(
                            "Failed to poll {} after {} attempts, will continue trying silently",
                            poller.url(),
                            failures
                        );
                    }
                    FailureLog::Unusable => {
                        error!("Device at {} sent an unusable reading: {}", poller.url(), e);
                    }
                    FailureLog::Quiet => {
                        debug!("Failed to poll {}: {} (attempt {})", poller.url(), e, failures);
                    }
                }
            }
        }
    }

    state.collector.set_running(false);
}

/// How loudly a failed poll is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureLog {
    /// Transient failure early in a streak.
    Retrying,
    /// The streak just outgrew the noisy window.
    GivingUp,
    /// The device answered with something no retry will fix.
    Unusable,
    /// Already reported for this streak.
    Quiet,
}

impl FailureLog {
    fn classify(error: &CollectorError, failures: u32) -> Self {
        if !error.is_transient() {
            // Reported once per streak; it repeats every tick until fixed.
            return if failures <= 1 { Self::Unusable } else { Self::Quiet };
        }
        if failures <= NOISY_FAILURES {
            Self::Retrying
        } else if failures == NOISY_FAILURES + 1 {
            Self::GivingUp
        } else {
            Self::Quiet
        }
    }
}

/// Run one poll cycle.
///
/// On success the reading is processed, appended to history and checked for
/// danger, and a success envelope is published. On failure a fallback
/// envelope is published and the session and alert slot are left untouched.
pub async fn poll_once(
    state: &AppState,
    poller: &DevicePoller,
) -> Result<ProcessedResult, CollectorError> {
    let now = OffsetDateTime::now_utc();

    let reading = match poller.fetch().await {
        Ok(reading) => reading,
        Err(e) => {
            let message = e.to_string();
            *state.latest.write().await = SensorResponse::fallback(message.clone(), now);
            state.collector.record_failure(now, message).await;
            return Err(CollectorError::Fetch(e));
        }
    };

    // The session guard spans the append and the alert check so a concurrent
    // reset either sees none of this reading or all of it.
    let mut session = state.session.lock().await;
    let processed = session.process(&reading);
    let meta = session.meta();

    {
        let store = state.store.lock().await;
        if let Err(e) = store.append(&reading, now) {
            error!("Failed to store reading: {}", e);
        }
    }

    state
        .alerts
        .lock()
        .await
        .observe(Danger::evaluate(&reading), now);
    drop(session);

    *state.latest.write().await = SensorResponse::success(reading, processed.clone(), meta, now);

    let recovered_from = state.collector.record_success(now).await;
    if recovered_from > NOISY_FAILURES {
        info!(
            "Device {} reachable again after {} failed polls",
            poller.url(),
            recovered_from
        );
    }

    Ok(processed)
}

/// Collector errors.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to create poller: {0}")]
    Poller(roomsense_core::Error),
    #[error("Failed to fetch reading: {0}")]
    Fetch(roomsense_core::Error),
}

impl CollectorError {
    /// Whether a later poll may succeed without any change on our side.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Poller(_) => false,
            Self::Fetch(e) => e.is_transient(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;

    use axum::Json;
    use axum::Router;
    use axum::routing::get;
    use roomsense_core::DangerKey;
    use roomsense_store::Store;
    use roomsense_types::Level;
    use serde_json::{Value, json};

    use crate::config::Config;

    async fn serve(payload: Value) -> SocketAddr {
        let app = Router::new().route("/data", get(move || async move { Json(payload) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn create_test_state(url: &str) -> Arc<AppState> {
        let mut config = Config::default();
        config.device.url = url.to_string();
        config.device.poll_interval_ms = 500;
        config.device.timeout_ms = 500;
        AppState::new(Store::open_in_memory().unwrap(), config)
    }

    fn poller(url: &str) -> DevicePoller {
        DevicePoller::new(url, Duration::from_millis(500)).unwrap()
    }

    /// An address nothing listens on.
    async fn dead_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/data", addr)
    }

    #[tokio::test]
    async fn test_poll_once_success_updates_everything() {
        let addr = serve(json!({
            "temp": 24.5, "hum": 50, "mq135": 120, "light": 0, "sound": 0, "mq2": 0
        }))
        .await;
        let url = format!("http://{}/data", addr);
        let state = create_test_state(&url);

        let result = poll_once(&state, &poller(&url)).await.unwrap();
        assert_eq!(result.room_status, Level::Good);
        assert_eq!(result.comfort_index, 100);

        let latest = state.latest.read().await;
        assert!(latest.success);
        assert!(!latest.fallback);
        assert_eq!(latest.meta.as_ref().unwrap().sample_count, 1);
        assert_eq!(latest.raw.as_ref().unwrap().gas_quality_raw, 120);

        assert_eq!(state.store.lock().await.count().unwrap(), 1);
        assert!(state.alerts.lock().await.active().is_none());

        let stats = state.collector.stats.read().await;
        assert_eq!(stats.success_count, 1);
        assert_eq!(stats.failure_count, 0);
    }

    #[tokio::test]
    async fn test_poll_once_raises_danger() {
        let addr = serve(json!({
            "temp": 24.5, "hum": 50, "mq135": 120, "light": 0, "sound": 0, "mq2": 1
        }))
        .await;
        let url = format!("http://{}/data", addr);
        let state = create_test_state(&url);
        let poller = poller(&url);

        poll_once(&state, &poller).await.unwrap();
        poll_once(&state, &poller).await.unwrap();

        let alerts = state.alerts.lock().await;
        assert_eq!(alerts.active().unwrap().danger.key, DangerKey::Gas);
        assert_eq!(alerts.shown_count(), 1);
    }

    #[tokio::test]
    async fn test_reset_during_poll_leaves_no_stale_alert() {
        let addr = serve(json!({
            "temp": 24.5, "hum": 50, "mq135": 120, "light": 0, "sound": 0, "mq2": 1
        }))
        .await;
        let url = format!("http://{}/data", addr);
        let state = create_test_state(&url);

        // Park the poll on the store lock after it has processed the reading.
        let store = state.store.lock().await;
        let poll = tokio::spawn({
            let state = Arc::clone(&state);
            let poller = poller(&url);
            async move { poll_once(&state, &poller).await }
        });
        for _ in 0..100 {
            if state.session.try_lock().is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(state.session.try_lock().is_err());

        let reset = tokio::spawn({
            let state = Arc::clone(&state);
            async move { state.reset_session().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!reset.is_finished());

        drop(store);
        poll.await.unwrap().unwrap();
        let (discarded, _) = reset.await.unwrap();

        assert_eq!(discarded, 1);
        assert_eq!(state.session.lock().await.sample_count(), 0);
        assert!(state.alerts.lock().await.active().is_none());
        assert_eq!(state.store.lock().await.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_poll_once_failure_keeps_session() {
        let url = dead_url().await;
        let state = create_test_state(&url);

        let err = poll_once(&state, &poller(&url)).await.unwrap_err();
        assert!(matches!(err, CollectorError::Fetch(_)));

        let latest = state.latest.read().await;
        assert!(!latest.success);
        assert!(latest.fallback);
        assert!(latest.error.is_some());
        assert_eq!(latest.processed, ProcessedResult::fallback());

        assert_eq!(state.session.lock().await.sample_count(), 0);
        assert_eq!(state.store.lock().await.count().unwrap(), 0);

        let stats = state.collector.stats.read().await;
        assert_eq!(stats.failure_count, 1);
        assert_eq!(stats.consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_poll_once_invalid_payload_is_a_failure() {
        let addr = serve(json!({"temp": 24.5})).await;
        let url = format!("http://{}/data", addr);
        let state = create_test_state(&url);

        assert!(poll_once(&state, &poller(&url)).await.is_err());
        assert_eq!(state.session.lock().await.sample_count(), 0);
        assert!(state.latest.read().await.fallback);
    }

    #[tokio::test]
    async fn test_failure_logging_by_cause() {
        let url = dead_url().await;
        let state = create_test_state(&url);
        let unreachable = poll_once(&state, &poller(&url)).await.unwrap_err();
        assert!(unreachable.is_transient());

        let addr = serve(json!({"temp": 24.5})).await;
        let url = format!("http://{}/data", addr);
        let state = create_test_state(&url);
        let invalid = poll_once(&state, &poller(&url)).await.unwrap_err();
        assert!(!invalid.is_transient());

        let streak: Vec<_> = (1..=6)
            .map(|n| FailureLog::classify(&unreachable, n))
            .collect();
        assert_eq!(
            streak,
            [
                FailureLog::Retrying,
                FailureLog::Retrying,
                FailureLog::Retrying,
                FailureLog::GivingUp,
                FailureLog::Quiet,
                FailureLog::Quiet,
            ]
        );

        assert_eq!(FailureLog::classify(&invalid, 1), FailureLog::Unusable);
        assert_eq!(FailureLog::classify(&invalid, 2), FailureLog::Quiet);
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let addr = serve(json!({
            "temp": 22.0, "hum": 45, "mq135": 200, "light": 0, "sound": 0, "mq2": 0
        }))
        .await;
        let state = create_test_state(&format!("http://{}/data", addr));
        let collector = Collector::new(Arc::clone(&state));

        assert!(collector.start().await.unwrap());
        assert!(state.collector.is_running());
        assert!(!collector.start().await.unwrap());

        // The first tick fires immediately.
        for _ in 0..50 {
            if state.collector.stats.read().await.success_count > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(state.latest.read().await.success);

        assert!(collector.stop().await);
        assert!(!state.collector.is_running());
        assert!(!collector.stop().await);

        // Restart after a stop.
        assert!(collector.start().await.unwrap());
        assert!(collector.stop().await);
    }

    #[tokio::test]
    async fn test_start_rejects_bad_url() {
        let state = create_test_state("not-a-url");
        let collector = Collector::new(state);
        assert!(matches!(
            collector.start().await,
            Err(CollectorError::Poller(_))
        ));
    }
}
