//! Local history persistence for RoomSense sensor readings.
//!
//! This crate provides SQLite-based storage for processed polls, so the
//! dashboard can show history without keeping it in the browser.
//!
//! # Features
//!
//! - Append readings with timestamps, capped at a maximum record count
//! - Query by time range with pagination
//! - Per-day listings and hourly averages
//! - CSV export
//!
//! # Example
//!
//! ```no_run
//! use roomsense_store::{HistoryQuery, Store};
//!
//! let store = Store::open_default()?;
//!
//! let recent = store.query(&HistoryQuery::new().limit(10))?;
//! for record in recent {
//!     println!("{}: {}", record.timestamp, record.mq135);
//! }
//! # Ok::<(), roomsense_store::Error>(())
//! ```

mod error;
mod models;
mod queries;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::{HistoryRecord, HourlyStats};
pub use queries::HistoryQuery;
pub use store::{CSV_HEADERS, DEFAULT_MAX_RECORDS, Store};

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/roomsense/history.db`
/// - macOS: `~/Library/Application Support/roomsense/history.db`
/// - Windows: `C:\Users\<user>\AppData\Local\roomsense\history.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("roomsense")
        .join("history.db")
}
