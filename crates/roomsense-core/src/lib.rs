//! Sensor reading pipeline for the RoomSense environmental monitor.
//!
//! This crate turns raw readings from a single embedded sensor device into
//! smoothed values, per-channel severity levels, a room status, a comfort
//! index and a human-readable status line.
//!
//! # Features
//!
//! - **Smoothing**: five-sample moving windows for temperature, humidity and gas quality
//! - **Baseline**: one-shot gas-quality reference captured after warm-up
//! - **Classification**: fixed band tables per channel
//! - **Aggregation**: room status and a 0-100 comfort index
//! - **Danger notifications**: single-slot, deduplicated by cause
//! - **Device polling**: bounded HTTP fetch with payload validation
//!
//! # Channels
//!
//! | Channel | Kind | Alerts at |
//! |---------|------|-----------|
//! | Temperature | Smoothed, °C | Bad |
//! | Humidity | Smoothed, % | Bad |
//! | Air quality | Latest raw value | Bad |
//! | Light | Indicator | never |
//! | Noise | Indicator | never |
//! | Gas/smoke | Indicator | Dangerous |
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use roomsense_core::{DevicePoller, ProcessingSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let poller = DevicePoller::new("http://192.168.4.1/data", Duration::from_secs(5))?;
//!     let mut session = ProcessingSession::new();
//!
//!     let reading = poller.fetch().await?;
//!     let result = session.process(&reading);
//!     println!("Comfort {}: {}", result.comfort_index, result.message);
//!
//!     Ok(())
//! }
//! ```

pub mod alerts;
pub mod baseline;
pub mod buffer;
pub mod comfort;
pub mod error;
pub mod messages;
pub mod poller;
pub mod session;
pub mod thresholds;
pub mod validation;

// Re-export the shared data model
pub use roomsense_types::types;

// Core exports
pub use alerts::{ActiveAlert, AlertTracker, AlertTransition, Danger, DangerKey};
pub use baseline::{BaselineEstimator, WARM_UP_SAMPLES};
pub use buffer::{BUFFER_CAPACITY, ChannelBuffers, SampleBuffer};
pub use comfort::{comfort_index, comfort_level, room_status};
pub use error::{Error, Result};
pub use messages::STABLE_MESSAGE;
pub use poller::{DEFAULT_DEVICE_URL, DEFAULT_TIMEOUT, DevicePoller};
pub use session::ProcessingSession;
pub use thresholds::{ChannelInput, classify};
pub use validation::{parse_reading, parse_reading_str};

// Re-export from roomsense-types
pub use roomsense_types::{
    Channel, Level, ParseError, ProcessedResult, RawReading, SensorResponse, SessionMeta,
};
