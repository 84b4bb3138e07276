//! The stateful processing session.
//!
//! A [`ProcessingSession`] owns the sample buffers, the gas-quality baseline
//! and the sample counter. [`ProcessingSession::process`] is the only entry
//! point that mutates it; everything it computes is returned as an immutable
//! [`ProcessedResult`].
//!
//! One session serves one device. It is not meant to be driven concurrently;
//! callers that share it across tasks wrap it in a lock.
//!
//! # Example
//!
//! ```
//! use roomsense_core::ProcessingSession;
//! use roomsense_types::{Level, RawReading};
//!
//! let mut session = ProcessingSession::new();
//! let result = session.process(&RawReading::new(Some((24.5, 50.0)), 120));
//!
//! assert_eq!(result.room_status, Level::Good);
//! assert_eq!(result.comfort_index, 100);
//! assert_eq!(session.sample_count(), 1);
//! ```

use tracing::debug;

use roomsense_types::{
    Averages, Channel, ChannelAlerts, ChannelLevels, ProcessedResult, RawReading, SessionMeta,
    Stable,
};

use crate::baseline::BaselineEstimator;
use crate::buffer::ChannelBuffers;
use crate::comfort::{comfort_index, room_status};
use crate::messages::{MessageInput, compose};
use crate::thresholds::{
    classify_air_quality, classify_gas_smoke, classify_humidity, classify_light, classify_noise,
    classify_temperature, is_alert,
};

/// Smoothing, baseline and scoring state for one device.
#[derive(Debug, Clone, Default)]
pub struct ProcessingSession {
    buffers: ChannelBuffers,
    baseline: BaselineEstimator,
    sample_count: u64,
}

impl ProcessingSession {
    /// Create a fresh session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one validated reading.
    pub fn process(&mut self, reading: &RawReading) -> ProcessedResult {
        self.sample_count += 1;

        // A faulted climate sensor contributes nothing to its buffers.
        if let Some(climate) = reading.climate {
            self.buffers.push(Channel::Temperature, climate.temperature);
            self.buffers.push(Channel::Humidity, climate.humidity);
        }
        self.buffers
            .push(Channel::AirQuality, reading.gas_quality_raw as f64);

        self.baseline.update(
            self.sample_count,
            self.buffers.average(Channel::AirQuality),
        );

        let avg = self.averages();
        let level = ChannelLevels {
            temp: classify_temperature(avg.temp),
            hum: classify_humidity(avg.hum),
            air: classify_air_quality(reading.gas_quality_raw),
            light: classify_light(reading.light_deficient),
            noise: classify_noise(reading.noise_present),
            gas: classify_gas_smoke(reading.gas_or_smoke_detected),
        };
        let alert = ChannelAlerts {
            temp: is_alert(Channel::Temperature, level.temp),
            hum: is_alert(Channel::Humidity, level.hum),
            air: is_alert(Channel::AirQuality, level.air),
            light: is_alert(Channel::Light, level.light),
            noise: is_alert(Channel::Noise, level.noise),
            gas: is_alert(Channel::GasSmoke, level.gas),
        };

        let room_status = room_status(&level);
        let comfort_index = comfort_index(&level);
        let message = compose(&MessageInput {
            reading,
            avg_temp: avg.temp,
            avg_hum: avg.hum,
            alert: &alert,
            room_status,
        });

        debug!(
            sample = self.sample_count,
            room_status = room_status.value(),
            comfort_index,
            "Processed reading"
        );

        ProcessedResult {
            avg,
            stable: Stable {
                light: reading.light_deficient,
                sound: reading.noise_present,
                mq2: reading.gas_or_smoke_detected,
            },
            level,
            alert,
            room_status,
            comfort_index,
            message,
        }
    }

    /// Current buffer means; the gas-quality mean is 0 before any sample.
    pub fn averages(&self) -> Averages {
        Averages {
            temp: self.buffers.average(Channel::Temperature),
            hum: self.buffers.average(Channel::Humidity),
            mq135: self.buffers.average(Channel::AirQuality).unwrap_or(0.0),
        }
    }

    /// Readings processed since creation or the last reset.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Whether the gas-quality baseline has been captured.
    pub fn is_baseline_ready(&self) -> bool {
        self.baseline.is_ready()
    }

    /// The captured gas-quality baseline.
    pub fn baseline(&self) -> Option<u32> {
        self.baseline.value()
    }

    /// Bookkeeping reported next to each result.
    pub fn meta(&self) -> SessionMeta {
        SessionMeta {
            sample_count: self.sample_count,
            baseline_ready: self.is_baseline_ready(),
            baseline: self.baseline(),
        }
    }

    /// Restart the session: empty buffers, no baseline, zero samples.
    pub fn reset(&mut self) {
        self.buffers.clear();
        self.baseline.reset();
        self.sample_count = 0;
        debug!("Processing session reset");
    }
}
