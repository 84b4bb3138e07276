//! Background collector and HTTP REST API for the RoomSense monitor.
//!
//! This crate provides a service that:
//! - Polls the sensor device on a fixed interval
//! - Runs every reading through one processing session
//! - Stores readings in the local history database
//! - Tracks the single danger notification
//! - Exposes a REST API for the dashboard
//!
//! # REST API Endpoints
//!
//! - `GET /api/health` - Service health check
//! - `GET /api/status` - Collector, session and history summary
//! - `GET /api/sensor-data` - Latest processed envelope (503 while unreachable)
//! - `GET /api/alert` - Active danger notification
//! - `POST /api/alert/dismiss` - Dismiss the active notification
//! - `POST /api/session/reset` - Restart averaging and baseline capture
//! - `POST /api/collector/start`, `POST /api/collector/stop`
//! - `GET /api/history` - Stored readings with time filters and pagination
//! - `GET /api/history/day`, `GET /api/history/hourly` - One local day
//! - `GET /api/history/export` - CSV download
//! - `DELETE /api/history` - Drop stored history
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/roomsense/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [storage]
//! path = "~/.local/share/roomsense/history.db"
//! max_records = 1000
//!
//! [device]
//! url = "http://192.168.4.1/data"
//! poll_interval_ms = 1000
//! timeout_ms = 5000
//! ```

pub mod api;
pub mod collector;
pub mod config;
pub mod replay;
pub mod state;

pub use collector::{Collector, CollectorError, poll_once};
pub use config::{Config, ConfigError, DeviceConfig, ServerConfig, StorageConfig};
pub use replay::{ReplaySummary, replay};
pub use state::{AppState, CollectorState, PollStats};
