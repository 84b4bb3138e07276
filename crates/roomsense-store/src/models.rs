//! Data models for stored history.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use roomsense_types::RawReading;

/// One stored poll.
///
/// The shape mirrors the device payload so the dashboard can chart history
/// and live data with the same code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Database row ID.
    pub id: i64,
    /// When the reading was taken.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Temperature in °C, `None` on a climate sensor fault.
    pub temp: Option<f64>,
    /// Relative humidity in %, `None` on a climate sensor fault.
    pub hum: Option<f64>,
    /// Raw gas-quality value.
    pub mq135: u32,
    /// Light-deficiency indicator.
    #[serde(with = "roomsense_types::types::flag")]
    pub light: bool,
    /// Noise indicator.
    #[serde(with = "roomsense_types::types::flag")]
    pub sound: bool,
    /// Gas/smoke indicator.
    #[serde(with = "roomsense_types::types::flag")]
    pub mq2: bool,
}

impl HistoryRecord {
    /// Build an unsaved record from a validated reading.
    pub fn from_reading(reading: &RawReading, at: OffsetDateTime) -> Self {
        Self {
            id: 0, // Will be set by database
            timestamp: at,
            temp: reading.temperature(),
            hum: reading.humidity(),
            mq135: reading.gas_quality_raw,
            light: reading.light_deficient,
            sound: reading.noise_present,
            mq2: reading.gas_or_smoke_detected,
        }
    }

    /// Convert back to a reading (without firmware extras).
    pub fn to_reading(&self) -> RawReading {
        let climate = self.temp.zip(self.hum);
        RawReading::new(climate, self.mq135)
            .with_light_deficient(self.light)
            .with_noise(self.sound)
            .with_gas_smoke(self.mq2)
    }
}

/// Averages for one hour of a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyStats {
    /// Hour of day, 0-23, in the requested offset.
    pub hour: u8,
    /// Mean temperature over records that have one.
    pub avg_temp: Option<f64>,
    /// Mean humidity over records that have one.
    pub avg_hum: Option<f64>,
    /// Mean raw gas quality over all records.
    pub avg_mq135: f64,
    /// Number of records in the hour.
    pub count: u64,
}
