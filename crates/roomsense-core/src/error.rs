//! Error types for roomsense-core.
//!
//! # Error Recovery Strategies
//!
//! | Error Type | Strategy | Rationale |
//! |------------|----------|-----------|
//! | [`Error::Validation`] | Drop the reading | Payload is malformed; the session is left untouched |
//! | [`Error::Timeout`] | Wait for the next poll | Device busy or WiFi congested |
//! | [`Error::Http`] | Wait for the next poll | Device unreachable |
//! | [`Error::DeviceStatus`] | Wait for the next poll | Device answered but not with data |
//! | [`Error::InvalidUrl`] | Do not retry | Fix the configured device URL |
//!
//! Transport errors never reach the dashboard as failures of the page itself:
//! the service turns them into a fallback
//! [`SensorResponse`](roomsense_types::SensorResponse) with `success = false`.

use std::time::Duration;

use thiserror::Error;

use roomsense_types::ParseError;

/// Errors that can occur while fetching or validating sensor readings.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The device payload failed validation.
    #[error("Invalid reading: {0}")]
    Validation(#[from] ParseError),

    /// HTTP transport error.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// The device answered with a non-success status code.
    #[error("Device at {url} returned status {status}")]
    DeviceStatus {
        /// The polled URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The device URL is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Whether the next poll may succeed without any change on our side.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Timeout { .. } | Self::DeviceStatus { .. }
        )
    }
}

/// Result type alias using roomsense-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
