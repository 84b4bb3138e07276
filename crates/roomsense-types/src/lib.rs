//! Platform-agnostic types for the RoomSense environmental monitor.
//!
//! This crate holds the data model shared by the processing core, the
//! history store and the HTTP service.
//!
//! # Features
//!
//! - Validated raw readings ([`RawReading`]) with optional firmware extras
//! - Severity levels ([`Level`]) and channel identifiers ([`Channel`])
//! - The processed-result wire contract ([`ProcessedResult`])
//! - The per-poll response envelope ([`SensorResponse`])
//! - Error types for payload validation
//!
//! # Example
//!
//! ```
//! use roomsense_types::{Level, ProcessedResult};
//!
//! let fallback = ProcessedResult::fallback();
//! assert_eq!(fallback.room_status, Level::Good);
//! assert_eq!(fallback.comfort_index, 0);
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    Averages, Channel, ChannelAlerts, ChannelLevels, Climate, FALLBACK_MESSAGE, Level,
    ProcessedResult, Provenance, RawReading, SensorResponse, SessionMeta, Stable,
};
