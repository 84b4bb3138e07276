//! REST API endpoints for the roomsense-service.
//!
//! This module exposes the latest processed reading, the danger notification,
//! collector control and the stored history.
//!
//! # Lock Acquisition
//!
//! Handlers hold each lock only for the duration of one operation. When more
//! than one is needed they are taken in the order `session`, `store`,
//! `alerts`, `latest`, matching the collector.
//!
//! ## Error Handling
//!
//! All endpoints return structured JSON errors via [`AppError`]. Store errors are
//! automatically converted and return HTTP 500. Client errors return 4xx.
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use roomsense_service::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

use roomsense_core::{ActiveAlert, DangerKey, comfort_level};
use roomsense_store::{HistoryQuery, HistoryRecord, HourlyStats};
use roomsense_types::{Level, SensorResponse, SessionMeta};

use crate::collector::Collector;
use crate::state::{AppState, PollStats};

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // Health and status
        .route("/api/health", get(health))
        .route("/api/status", get(get_status))
        // Live data
        .route("/api/sensor-data", get(get_sensor_data))
        .route("/api/alert", get(get_alert))
        .route("/api/alert/dismiss", post(dismiss_alert))
        .route("/api/session/reset", post(reset_session))
        // Collector control
        .route("/api/collector/start", post(collector_start))
        .route("/api/collector/stop", post(collector_stop))
        // History
        .route("/api/history", get(get_history).delete(clear_history))
        .route("/api/history/day", get(get_history_day))
        .route("/api/history/hourly", get(get_history_hourly))
        .route("/api/history/export", get(export_history))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
    })
}

/// Service status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: &'static str,
    pub device_url: String,
    pub poll_interval_ms: u64,
    pub collector: CollectorStatus,
    pub session: SessionMeta,
    /// Comfort bucket of the latest successful reading.
    pub comfort: Option<ComfortStatus>,
    /// Records currently kept in history.
    pub history_count: u64,
}

/// Collector status.
#[derive(Debug, Serialize)]
pub struct CollectorStatus {
    pub running: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(flatten)]
    pub stats: PollStats,
}

/// Comfort index with its bucket.
#[derive(Debug, Serialize)]
pub struct ComfortStatus {
    pub index: u8,
    pub level: Level,
    pub description: &'static str,
}

/// Get service status.
async fn get_status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, AppError> {
    let (device_url, poll_interval_ms) = {
        let config = state.config.read().await;
        (config.device.url.clone(), config.device.poll_interval_ms)
    };
    let session = state.session.lock().await.meta();
    let history_count = state.store.lock().await.count()?;

    let comfort = {
        let latest = state.latest.read().await;
        latest.success.then(|| {
            let index = latest.processed.comfort_index;
            let level = comfort_level(index);
            ComfortStatus {
                index,
                level,
                description: level.description(),
            }
        })
    };

    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        device_url,
        poll_interval_ms,
        collector: CollectorStatus {
            running: state.collector.is_running(),
            started_at: state.collector.started_at(),
            stats: state.collector.stats.read().await.clone(),
        },
        session,
        comfort,
        history_count,
    }))
}

/// Latest sensor envelope.
///
/// Answers 503 with the fallback envelope until the device has been reached,
/// and after any failed poll.
async fn get_sensor_data(State(state): State<Arc<AppState>>) -> (StatusCode, Json<SensorResponse>) {
    let latest = state.latest.read().await.clone();
    let status = if latest.success {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(latest))
}

/// Danger notification state.
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    /// The notification on display.
    pub active: Option<ActiveAlert>,
    /// A dismissed danger that is still present.
    pub acknowledged: Option<DangerKey>,
    /// Notifications shown since the last reset.
    pub shown_count: u64,
}

async fn alert_response(state: &AppState) -> AlertResponse {
    let alerts = state.alerts.lock().await;
    AlertResponse {
        active: alerts.active().cloned(),
        acknowledged: alerts.acknowledged(),
        shown_count: alerts.shown_count(),
    }
}

/// Get the danger notification.
async fn get_alert(State(state): State<Arc<AppState>>) -> Json<AlertResponse> {
    Json(alert_response(&state).await)
}

/// Dismiss the active danger notification.
async fn dismiss_alert(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AlertResponse>, AppError> {
    let dismissed = state.alerts.lock().await.dismiss();
    if dismissed.is_none() {
        return Err(AppError::NotFound("No active alert".to_string()));
    }
    Ok(Json(alert_response(&state).await))
}

/// Session reset response.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
    /// Samples discarded by the reset.
    pub discarded_samples: u64,
    pub session: SessionMeta,
}

/// Restart the processing session and clear the notification slot.
///
/// History is kept; use `DELETE /api/history` to drop it.
async fn reset_session(State(state): State<Arc<AppState>>) -> Json<ResetResponse> {
    let (discarded_samples, session) = state.reset_session().await;

    Json(ResetResponse {
        success: true,
        discarded_samples,
        session,
    })
}

/// Collector action response.
#[derive(Debug, Serialize)]
pub struct CollectorActionResponse {
    pub success: bool,
    pub message: String,
    pub running: bool,
}

/// Start the collector.
async fn collector_start(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CollectorActionResponse>, AppError> {
    let collector = Collector::new(Arc::clone(&state));
    let started = collector
        .start()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let message = if started {
        "Collector started"
    } else {
        "Collector is already running"
    };

    Ok(Json(CollectorActionResponse {
        success: started,
        message: message.to_string(),
        running: true,
    }))
}

/// Stop the collector.
async fn collector_stop(State(state): State<Arc<AppState>>) -> Json<CollectorActionResponse> {
    let collector = Collector::new(Arc::clone(&state));
    let stopped = collector.stop().await;

    let message = if stopped {
        "Collector stopped"
    } else {
        "Collector is not running"
    };

    Json(CollectorActionResponse {
        success: stopped,
        message: message.to_string(),
        running: false,
    })
}

/// Query parameters for history.
#[derive(Debug, Deserialize, Default)]
pub struct HistoryParams {
    /// Unix timestamp, inclusive.
    pub since: Option<i64>,
    /// Unix timestamp, inclusive.
    pub until: Option<i64>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl HistoryParams {
    /// Validate the query parameters.
    /// Returns an error if a timestamp is out of range or `since > until`.
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, value) in [("since", self.since), ("until", self.until)] {
            if let Some(ts) = value
                && OffsetDateTime::from_unix_timestamp(ts).is_err()
            {
                return Err(AppError::BadRequest(format!(
                    "Invalid '{}' timestamp: {}",
                    name, ts
                )));
            }
        }

        if let (Some(since), Some(until)) = (self.since, self.until)
            && since > until
        {
            return Err(AppError::BadRequest(format!(
                "Invalid time range: 'since' ({}) must be less than or equal to 'until' ({})",
                since, until
            )));
        }
        Ok(())
    }
}

/// Paginated response wrapper with metadata.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    /// The data items.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Pagination metadata.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    /// Number of items returned.
    pub count: usize,
    /// Offset from the beginning.
    pub offset: u32,
    /// Maximum items requested (if specified).
    pub limit: Option<u32>,
    /// Whether there are more items available.
    pub has_more: bool,
}

/// Get stored history, newest first.
///
/// # Query Parameters
///
/// - `since`: Unix timestamp to filter records from (inclusive)
/// - `until`: Unix timestamp to filter records until (inclusive)
/// - `limit`: Maximum number of records to return
/// - `offset`: Number of records to skip (for pagination)
async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<PaginatedResponse<HistoryRecord>>, AppError> {
    params.validate()?;

    let mut query = HistoryQuery::new();
    if let Some(since) = params.since
        && let Ok(dt) = OffsetDateTime::from_unix_timestamp(since)
    {
        query = query.since(dt);
    }
    if let Some(until) = params.until
        && let Ok(dt) = OffsetDateTime::from_unix_timestamp(until)
    {
        query = query.until(dt);
    }

    // Request one extra item to determine if there are more
    if let Some(limit) = params.limit {
        query = query.limit(limit.saturating_add(1));
    }
    if let Some(offset) = params.offset {
        query = query.offset(offset);
    }

    let mut records = state.store.lock().await.query(&query)?;

    let has_more = params.limit.is_some_and(|l| records.len() > l as usize);
    if has_more {
        records.pop();
    }

    Ok(Json(PaginatedResponse {
        pagination: PaginationMeta {
            count: records.len(),
            offset: params.offset.unwrap_or(0),
            limit: params.limit,
            has_more,
        },
        data: records,
    }))
}

/// Query parameters naming a local calendar day.
#[derive(Debug, Deserialize, Default)]
pub struct DayParams {
    /// `YYYY-MM-DD`; today in the given offset when omitted.
    pub date: Option<String>,
    /// Local offset from UTC in minutes, e.g. `120` for UTC+2.
    #[serde(default)]
    pub offset_minutes: i32,
}

impl DayParams {
    fn resolve(&self) -> Result<(Date, UtcOffset), AppError> {
        let offset = self
            .offset_minutes
            .checked_mul(60)
            .and_then(|secs| UtcOffset::from_whole_seconds(secs).ok())
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Invalid offset_minutes: {}",
                    self.offset_minutes
                ))
            })?;

        let date = match &self.date {
            Some(text) => Date::parse(text, format_description!("[year]-[month]-[day]"))
                .map_err(|_| {
                    AppError::BadRequest(format!(
                        "Invalid date '{}': expected YYYY-MM-DD",
                        text
                    ))
                })?,
            None => OffsetDateTime::now_utc().to_offset(offset).date(),
        };

        Ok((date, offset))
    }
}

/// Get every record from one local day, newest first.
async fn get_history_day(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DayParams>,
) -> Result<Json<Vec<HistoryRecord>>, AppError> {
    let (date, offset) = params.resolve()?;
    let records = state.store.lock().await.by_date(date, offset)?;
    Ok(Json(records))
}

/// Get hourly averages for one local day.
async fn get_history_hourly(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DayParams>,
) -> Result<Json<Vec<HourlyStats>>, AppError> {
    let (date, offset) = params.resolve()?;
    let stats = state.store.lock().await.hourly_stats(date, offset)?;
    Ok(Json(stats))
}

/// Download the history as CSV.
async fn export_history(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let mut buffer = Vec::new();
    state.store.lock().await.export_csv(&mut buffer)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"roomsense-history.csv\"",
            ),
        ],
        buffer,
    ))
}

/// History clear response.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub deleted: usize,
}

/// Delete all stored history.
async fn clear_history(State(state): State<Arc<AppState>>) -> Result<Json<ClearResponse>, AppError> {
    let deleted = state.store.lock().await.clear()?;
    Ok(Json(ClearResponse { deleted }))
}

/// API error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Store(roomsense_store::Error),
}

impl From<roomsense_store::Error> for AppError {
    fn from(e: roomsense_store::Error) -> Self {
        AppError::Store(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use roomsense_core::Danger;
    use roomsense_store::Store;
    use roomsense_types::RawReading;
    use serde_json::Value;
    use time::macros::datetime;
    use tower::ServiceExt;

    use crate::config::Config;

    fn create_test_state() -> Arc<AppState> {
        let store = Store::open_in_memory().unwrap();
        AppState::new(store, Config::default())
    }

    async fn response_body(response: axum::response::Response) -> String {
        let body = response.into_body();
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn send(state: &Arc<AppState>, method: Method, uri: &str) -> (StatusCode, String) {
        let app = router().with_state(Arc::clone(state));
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        (status, response_body(response).await)
    }

    async fn get_json(state: &Arc<AppState>, uri: &str) -> (StatusCode, Value) {
        let (status, body) = send(state, Method::GET, uri).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    fn comfortable() -> RawReading {
        RawReading::new(Some((24.5, 50.0)), 120)
    }

    async fn seed_history(state: &AppState) {
        let store = state.store.lock().await;
        store
            .append(&comfortable(), datetime!(2026-02-01 10:00:00 UTC))
            .unwrap();
        store
            .append(&comfortable(), datetime!(2026-02-01 10:30:00 UTC))
            .unwrap();
        store
            .append(
                &RawReading::new(None, 900).with_gas_smoke(true),
                datetime!(2026-02-01 11:15:00 UTC),
            )
            .unwrap();
    }

    /// Process one reading the way the collector does.
    async fn ingest(state: &AppState, reading: RawReading) {
        let now = OffsetDateTime::now_utc();
        let (processed, meta) = {
            let mut session = state.session.lock().await;
            (session.process(&reading), session.meta())
        };
        state
            .alerts
            .lock()
            .await
            .observe(Danger::evaluate(&reading), now);
        *state.latest.write().await = SensorResponse::success(reading, processed, meta, now);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let state = create_test_state();
        let (status, json) = get_json(&state, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_sensor_data_before_first_poll() {
        let state = create_test_state();
        let (status, json) = get_json(&state, "/api/sensor-data").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["success"], false);
        assert_eq!(json["fallback"], true);
        assert_eq!(json["processed"]["comfort_index"], 0);
        assert_eq!(json["processed"]["room_status"], 0);
        assert!(json.get("raw").is_none());
    }

    #[tokio::test]
    async fn test_sensor_data_after_reading() {
        let state = create_test_state();
        ingest(&state, comfortable()).await;

        let (status, json) = get_json(&state, "/api/sensor-data").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert!(json.get("fallback").is_none());
        assert_eq!(json["raw"]["mq135"], 120);
        assert_eq!(json["processed"]["avg"]["temp"], 24.5);
        assert_eq!(json["processed"]["comfort_index"], 100);
        assert_eq!(json["meta"]["sample_count"], 1);
        assert_eq!(json["meta"]["baseline_ready"], false);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let state = create_test_state();
        let (status, json) = get_json(&state, "/api/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["device_url"], "http://192.168.4.1/data");
        assert_eq!(json["poll_interval_ms"], 1000);
        assert_eq!(json["collector"]["running"], false);
        assert_eq!(json["collector"]["success_count"], 0);
        assert_eq!(json["session"]["sample_count"], 0);
        assert!(json["comfort"].is_null());
        assert_eq!(json["history_count"], 0);

        ingest(&state, comfortable()).await;
        let (_, json) = get_json(&state, "/api/status").await;
        assert_eq!(json["comfort"]["index"], 100);
        assert_eq!(json["comfort"]["level"], 0);
        assert_eq!(json["session"]["sample_count"], 1);
    }

    #[tokio::test]
    async fn test_alert_lifecycle() {
        let state = create_test_state();

        let (_, json) = get_json(&state, "/api/alert").await;
        assert!(json["active"].is_null());

        let (status, _) = send(&state, Method::POST, "/api/alert/dismiss").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        ingest(&state, comfortable().with_gas_smoke(true)).await;
        let (_, json) = get_json(&state, "/api/alert").await;
        assert_eq!(json["active"]["key"], "gas");
        assert_eq!(json["active"]["title"], "🚨 DANGER");
        assert!(json["active"]["raised_at"].is_string());
        assert_eq!(json["shown_count"], 1);

        let (status, body) = send(&state, Method::POST, "/api/alert/dismiss").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert!(json["active"].is_null());
        assert_eq!(json["acknowledged"], "gas");

        // Still smoky: stays dismissed.
        ingest(&state, comfortable().with_gas_smoke(true)).await;
        let (_, json) = get_json(&state, "/api/alert").await;
        assert!(json["active"].is_null());
        assert_eq!(json["shown_count"], 1);
    }

    #[tokio::test]
    async fn test_session_reset() {
        let state = create_test_state();
        for _ in 0..3 {
            ingest(&state, comfortable().with_gas_smoke(true)).await;
        }

        let (status, body) = send(&state, Method::POST, "/api/session/reset").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["discarded_samples"], 3);
        assert_eq!(json["session"]["sample_count"], 0);

        assert_eq!(state.session.lock().await.sample_count(), 0);
        assert!(state.alerts.lock().await.active().is_none());
    }

    #[tokio::test]
    async fn test_collector_stop_when_not_running() {
        let state = create_test_state();
        let (status, body) = send(&state, Method::POST, "/api/collector/stop").await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["running"], false);
    }

    #[tokio::test]
    async fn test_collector_start_with_bad_url() {
        let state = create_test_state();
        state.config.write().await.device.url = "sensor.local".to_string();

        let (status, body) = send(&state, Method::POST, "/api/collector/start").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("error"));
        assert!(!state.collector.is_running());
    }

    #[tokio::test]
    async fn test_history_pagination() {
        let state = create_test_state();
        seed_history(&state).await;

        let (status, json) = get_json(&state, "/api/history?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pagination"]["count"], 2);
        assert_eq!(json["pagination"]["has_more"], true);
        assert_eq!(json["data"][0]["mq135"], 900);
        assert!(json["data"][0]["temp"].is_null());
        assert_eq!(json["data"][0]["mq2"], 1);

        let (_, json) = get_json(&state, "/api/history?limit=2&offset=2").await;
        assert_eq!(json["pagination"]["count"], 1);
        assert_eq!(json["pagination"]["has_more"], false);
        assert_eq!(json["pagination"]["offset"], 2);
    }

    #[tokio::test]
    async fn test_history_time_range() {
        let state = create_test_state();
        seed_history(&state).await;

        let since = datetime!(2026-02-01 10:15:00 UTC).unix_timestamp();
        let until = datetime!(2026-02-01 11:00:00 UTC).unix_timestamp();
        let uri = format!("/api/history?since={}&until={}", since, until);
        let (_, json) = get_json(&state, &uri).await;
        assert_eq!(json["pagination"]["count"], 1);
        assert_eq!(json["data"][0]["timestamp"], "2026-02-01T10:30:00Z");

        let uri = format!("/api/history?since={}&until={}", until, since);
        let (status, json) = get_json(&state, &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("Invalid time range"));
    }

    #[tokio::test]
    async fn test_history_day_and_hourly() {
        let state = create_test_state();
        seed_history(&state).await;

        let (status, json) = get_json(&state, "/api/history/day?date=2026-02-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 3);

        let (status, json) = get_json(&state, "/api/history/hourly?date=2026-02-01").await;
        assert_eq!(status, StatusCode::OK);
        let hours = json.as_array().unwrap();
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[0]["hour"], 10);
        assert_eq!(hours[0]["count"], 2);
        assert_eq!(hours[1]["hour"], 11);
        assert!(hours[1]["avg_temp"].is_null());

        // UTC+1 shifts every record one hour later.
        let (_, json) =
            get_json(&state, "/api/history/hourly?date=2026-02-01&offset_minutes=60").await;
        assert_eq!(json[0]["hour"], 11);
    }

    #[tokio::test]
    async fn test_history_day_rejects_bad_params() {
        let state = create_test_state();

        let (status, _) = get_json(&state, "/api/history/hourly?date=01-02-2026").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            get_json(&state, "/api/history/day?date=2026-02-01&offset_minutes=100000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_history_export_csv() {
        let state = create_test_state();
        seed_history(&state).await;

        let app = router().with_state(Arc::clone(&state));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/history/export")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let body = response_body(response).await;
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Timestamp,Temp (°C),Humidity (%),MQ135,Light,Sound,MQ2");
        assert_eq!(lines[1], "2026-02-01T11:15:00Z,N/A,N/A,900,0,0,1");
    }

    #[tokio::test]
    async fn test_history_clear() {
        let state = create_test_state();
        seed_history(&state).await;

        let (status, body) = send(&state, Method::DELETE, "/api/history").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["deleted"], 3);
        assert_eq!(state.store.lock().await.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let state = create_test_state();
        let (status, _) = send(&state, Method::GET, "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
