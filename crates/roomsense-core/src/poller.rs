//! HTTP poller for the sensor device.
//!
//! The device serves its latest reading as JSON on a plain HTTP endpoint.
//! [`DevicePoller::fetch`] performs one bounded GET and validates the body.
//! There is no retry here: the caller's next poll tick is the retry.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use roomsense_core::DevicePoller;
//!
//! # async fn example() -> roomsense_core::Result<()> {
//! let poller = DevicePoller::new("http://192.168.4.1/data", Duration::from_secs(5))?;
//! let reading = poller.fetch().await?;
//! println!("Gas quality: {}", reading.gas_quality_raw);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{CACHE_CONTROL, HeaderValue};
use tracing::{debug, warn};

use roomsense_types::RawReading;

use crate::error::{Error, Result};
use crate::validation::parse_reading;

/// Default device endpoint on the sensor's own access point.
pub const DEFAULT_DEVICE_URL: &str = "http://192.168.4.1/data";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches and validates readings from one device.
#[derive(Debug, Clone)]
pub struct DevicePoller {
    client: Client,
    url: String,
    timeout: Duration,
}

impl DevicePoller {
    /// Create a poller for `url` with a per-request timeout.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(url, client, timeout)
    }

    /// Create a poller around an existing reqwest client.
    pub fn with_client(url: &str, client: Client, timeout: Duration) -> Result<Self> {
        let url = url.trim().to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                url
            )));
        }

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    /// The polled URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch and validate one reading.
    pub async fn fetch(&self) -> Result<RawReading> {
        debug!("Polling {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Device at {} returned {}", self.url, status);
            return Err(Error::DeviceStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        Ok(parse_reading(&body)?)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::timeout(format!("GET {}", self.url), self.timeout)
        } else if err.is_decode() {
            Error::Validation(roomsense_types::ParseError::InvalidJson(err.to_string()))
        } else {
            Error::Http(err)
        }
    }
}
