//! Core types for RoomSense sensor data.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;

/// Message carried by the fallback result when the device cannot be reached.
pub const FALLBACK_MESSAGE: &str =
    "⚠️ Cannot connect to the sensor device. Check the WiFi connection.";

/// A sensor signal monitored by the dashboard.
///
/// Temperature, humidity and air quality are continuous channels; light,
/// noise and gas/smoke are binary indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Channel {
    /// Ambient temperature (°C).
    Temperature,
    /// Relative humidity (%).
    Humidity,
    /// Gas-quality sensor, raw ADC units.
    AirQuality,
    /// Light-deficiency indicator.
    Light,
    /// Noise indicator.
    Noise,
    /// Gas/smoke detector.
    GasSmoke,
}

impl Channel {
    /// All channels in wire order.
    pub const ALL: [Channel; 6] = [
        Channel::Temperature,
        Channel::Humidity,
        Channel::AirQuality,
        Channel::Light,
        Channel::Noise,
        Channel::GasSmoke,
    ];

    /// Key used for this channel in the `level` and `alert` output objects.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Channel::Temperature => "temp",
            Channel::Humidity => "hum",
            Channel::AirQuality => "air",
            Channel::Light => "light",
            Channel::Noise => "noise",
            Channel::GasSmoke => "gas",
        }
    }

    /// Whether the channel carries a continuous value rather than a 0/1 indicator.
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            Channel::Temperature | Channel::Humidity | Channel::AirQuality
        )
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Temperature => write!(f, "Temperature"),
            Channel::Humidity => write!(f, "Humidity"),
            Channel::AirQuality => write!(f, "Air quality"),
            Channel::Light => write!(f, "Light"),
            Channel::Noise => write!(f, "Noise"),
            Channel::GasSmoke => write!(f, "Gas/smoke"),
        }
    }
}

/// Discrete severity of a channel or of the whole room.
///
/// # Ordering
///
/// Levels are ordered by severity: `Good < Normal < Medium < Bad < Dangerous`,
/// so the room status of several channels is simply their maximum.
///
/// # Serialization
///
/// Levels travel as their integer value (0-4), which is what the dashboard
/// front end expects.
///
/// ```
/// use roomsense_types::Level;
///
/// assert!(Level::Dangerous > Level::Bad);
/// assert_eq!(u8::from(Level::Medium), 2);
/// assert_eq!(Level::try_from(4), Ok(Level::Dangerous));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "u8", try_from = "u8"))]
#[repr(u8)]
pub enum Level {
    /// Within the comfortable band.
    #[default]
    Good = 0,
    /// Acceptable, not alarming.
    Normal = 1,
    /// Noticeably off.
    Medium = 2,
    /// Poor; raises a per-channel alert.
    Bad = 3,
    /// Hazardous.
    Dangerous = 4,
}

impl Level {
    /// All levels from least to most severe.
    pub const ALL: [Level; 5] = [
        Level::Good,
        Level::Normal,
        Level::Medium,
        Level::Bad,
        Level::Dangerous,
    ];

    /// Numeric value of the level.
    #[must_use]
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Short human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Level::Good => "Good - comfortable conditions",
            Level::Normal => "Normal - acceptable conditions",
            Level::Medium => "Medium - keep an eye on it",
            Level::Bad => "Bad - action recommended",
            Level::Dangerous => "Dangerous - act immediately",
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level as u8
    }
}

impl TryFrom<u8> for Level {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Level::Good),
            1 => Ok(Level::Normal),
            2 => Ok(Level::Medium),
            3 => Ok(Level::Bad),
            4 => Ok(Level::Dangerous),
            _ => Err(ParseError::InvalidLevel(value)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Good => write!(f, "Good"),
            Level::Normal => write!(f, "Normal"),
            Level::Medium => write!(f, "Medium"),
            Level::Bad => write!(f, "Bad"),
            Level::Dangerous => write!(f, "Dangerous"),
        }
    }
}

/// Temperature and humidity from the combined climate sensor.
///
/// The two values come from one physical sensor, so they are either both
/// available or both missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Climate {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
}

/// Extra fields reported by newer device firmware.
///
/// The core never depends on these; they are carried through so the raw
/// payload can be shown or stored unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Provenance {
    /// Whether the climate sensor reported a valid sample.
    pub dht_ok: bool,
    /// Raw analog value behind the light indicator.
    pub light_value: f64,
    /// Raw analog value behind the noise indicator.
    pub sound_value: f64,
    /// Raw analog value behind the gas/smoke indicator.
    pub mq2_value: f64,
    /// Device-side alert flag for the gas-quality channel.
    pub mq135_alert: bool,
    /// Device message for the noise sensor.
    pub sound_msg: Option<String>,
    /// Device message for the light sensor.
    pub light_msg: Option<String>,
    /// Device message for the gas/smoke sensor.
    pub mq2_msg: Option<String>,
    /// Device message for the gas-quality sensor.
    pub mq135_msg: Option<String>,
    /// Device message for the climate sensor.
    pub dht_msg: Option<String>,
}

/// One poll's worth of raw sensor data, already validated.
///
/// ```
/// use roomsense_types::RawReading;
///
/// let reading = RawReading::new(Some((24.5, 50.0)), 120).with_noise(true);
/// assert_eq!(reading.temperature(), Some(24.5));
/// assert!(reading.noise_present);
/// assert!(!reading.gas_or_smoke_detected);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    /// Climate sample, `None` when the climate sensor reported a fault.
    pub climate: Option<Climate>,
    /// Gas-quality value in raw ADC units.
    pub gas_quality_raw: u32,
    /// Light level is below the comfortable threshold.
    pub light_deficient: bool,
    /// Noise above the detector threshold.
    pub noise_present: bool,
    /// Gas or smoke detected.
    pub gas_or_smoke_detected: bool,
    /// Extended firmware fields, when the device sends them.
    pub provenance: Option<Provenance>,
}

impl RawReading {
    /// Create a reading with all binary indicators off.
    pub fn new(climate: Option<(f64, f64)>, gas_quality_raw: u32) -> Self {
        Self {
            climate: climate.map(|(temperature, humidity)| Climate {
                temperature,
                humidity,
            }),
            gas_quality_raw,
            light_deficient: false,
            noise_present: false,
            gas_or_smoke_detected: false,
            provenance: None,
        }
    }

    /// Set the light-deficiency indicator.
    #[must_use]
    pub fn with_light_deficient(mut self, value: bool) -> Self {
        self.light_deficient = value;
        self
    }

    /// Set the noise indicator.
    #[must_use]
    pub fn with_noise(mut self, value: bool) -> Self {
        self.noise_present = value;
        self
    }

    /// Set the gas/smoke indicator.
    #[must_use]
    pub fn with_gas_smoke(mut self, value: bool) -> Self {
        self.gas_or_smoke_detected = value;
        self
    }

    /// Attach extended firmware fields.
    #[must_use]
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Temperature, if the climate sensor delivered a sample.
    pub fn temperature(&self) -> Option<f64> {
        self.climate.map(|c| c.temperature)
    }

    /// Humidity, if the climate sensor delivered a sample.
    pub fn humidity(&self) -> Option<f64> {
        self.climate.map(|c| c.humidity)
    }
}

#[cfg(feature = "serde")]
impl Serialize for RawReading {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let extra = if self.provenance.is_some() { 10 } else { 0 };
        let mut map = serializer.serialize_map(Some(6 + extra))?;
        map.serialize_entry("temp", &self.temperature())?;
        map.serialize_entry("hum", &self.humidity())?;
        map.serialize_entry("mq135", &self.gas_quality_raw)?;
        map.serialize_entry("light", &u8::from(self.light_deficient))?;
        map.serialize_entry("sound", &u8::from(self.noise_present))?;
        map.serialize_entry("mq2", &u8::from(self.gas_or_smoke_detected))?;

        if let Some(p) = &self.provenance {
            map.serialize_entry("dht_ok", &u8::from(p.dht_ok))?;
            map.serialize_entry("light_value", &p.light_value)?;
            map.serialize_entry("sound_value", &p.sound_value)?;
            map.serialize_entry("mq2_value", &p.mq2_value)?;
            map.serialize_entry("mq135_alert", &u8::from(p.mq135_alert))?;
            map.serialize_entry("sound_msg", &p.sound_msg)?;
            map.serialize_entry("light_msg", &p.light_msg)?;
            map.serialize_entry("mq2_msg", &p.mq2_msg)?;
            map.serialize_entry("mq135_msg", &p.mq135_msg)?;
            map.serialize_entry("dht_msg", &p.dht_msg)?;
        }

        map.end()
    }
}

/// Serde adapter that writes booleans as `0`/`1` and accepts only those.
///
/// Use with `#[serde(with = "roomsense_types::types::flag")]`.
#[cfg(feature = "serde")]
pub mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(serde::de::Error::custom(format!(
                "expected 0 or 1, got {other}"
            ))),
        }
    }
}

/// Smoothed channel values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Averages {
    /// Mean buffered temperature, `None` while no valid sample exists.
    pub temp: Option<f64>,
    /// Mean buffered humidity, `None` while no valid sample exists.
    pub hum: Option<f64>,
    /// Mean buffered gas-quality value (display only).
    pub mq135: f64,
}

/// Binary indicators passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Stable {
    /// Light deficient.
    #[cfg_attr(feature = "serde", serde(with = "flag"))]
    pub light: bool,
    /// Noise present.
    #[cfg_attr(feature = "serde", serde(with = "flag"))]
    pub sound: bool,
    /// Gas/smoke detected.
    #[cfg_attr(feature = "serde", serde(with = "flag"))]
    pub mq2: bool,
}

/// Severity level of every channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelLevels {
    pub temp: Level,
    pub hum: Level,
    pub air: Level,
    pub light: Level,
    pub noise: Level,
    pub gas: Level,
}

impl ChannelLevels {
    /// Level of a single channel.
    pub fn get(&self, channel: Channel) -> Level {
        match channel {
            Channel::Temperature => self.temp,
            Channel::Humidity => self.hum,
            Channel::AirQuality => self.air,
            Channel::Light => self.light,
            Channel::Noise => self.noise,
            Channel::GasSmoke => self.gas,
        }
    }
}

/// Per-channel alert flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelAlerts {
    #[cfg_attr(feature = "serde", serde(with = "flag"))]
    pub temp: bool,
    #[cfg_attr(feature = "serde", serde(with = "flag"))]
    pub hum: bool,
    #[cfg_attr(feature = "serde", serde(with = "flag"))]
    pub air: bool,
    #[cfg_attr(feature = "serde", serde(with = "flag"))]
    pub light: bool,
    #[cfg_attr(feature = "serde", serde(with = "flag"))]
    pub noise: bool,
    #[cfg_attr(feature = "serde", serde(with = "flag"))]
    pub gas: bool,
}

impl ChannelAlerts {
    /// Alert flag of a single channel.
    pub fn get(&self, channel: Channel) -> bool {
        match channel {
            Channel::Temperature => self.temp,
            Channel::Humidity => self.hum,
            Channel::AirQuality => self.air,
            Channel::Light => self.light,
            Channel::Noise => self.noise,
            Channel::GasSmoke => self.gas,
        }
    }

    /// Whether any channel is in alert.
    pub fn any(&self) -> bool {
        Channel::ALL.iter().any(|c| self.get(*c))
    }
}

/// Output of processing one raw reading.
///
/// The serialized field names and value ranges are the integration contract
/// with the dashboard front end and must stay stable.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProcessedResult {
    /// Smoothed values.
    pub avg: Averages,
    /// Binary indicators.
    pub stable: Stable,
    /// Per-channel severity.
    pub level: ChannelLevels,
    /// Per-channel alert flags.
    pub alert: ChannelAlerts,
    /// Aggregate severity of the danger-relevant channels.
    pub room_status: Level,
    /// Overall comfort, 0-100.
    pub comfort_index: u8,
    /// Human-readable status line.
    pub message: String,
}

impl ProcessedResult {
    /// The result reported while the device is unreachable.
    ///
    /// Note that a comfort index of 0 together with `room_status = Good`
    /// is never produced by real processing, and the surrounding
    /// [`SensorResponse`] is marked unsuccessful as well.
    pub fn fallback() -> Self {
        Self {
            message: FALLBACK_MESSAGE.to_string(),
            ..Self::default()
        }
    }
}

/// Processing-session bookkeeping reported next to each result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionMeta {
    /// Samples processed since the session started.
    pub sample_count: u64,
    /// Whether the gas-quality baseline has been captured.
    pub baseline_ready: bool,
    /// The captured baseline, rounded to raw units.
    pub baseline: Option<u32>,
}

/// Envelope returned to the dashboard for each poll.
///
/// A failed poll is reported with `success = false` and `fallback = true`
/// so the UI never mistakes an outage for a safe room.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SensorResponse {
    /// Whether the device was reached and the reading processed.
    pub success: bool,
    /// When this response was produced.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,
    /// The validated raw reading.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub raw: Option<RawReading>,
    /// The processed result (or the fallback result).
    pub processed: ProcessedResult,
    /// Session bookkeeping.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub meta: Option<SessionMeta>,
    /// Error description for failed polls.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
    /// Set when `processed` is the fallback result.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "is_false"))]
    pub fallback: bool,
}

#[cfg(feature = "serde")]
fn is_false(value: &bool) -> bool {
    !*value
}

impl SensorResponse {
    /// Envelope for a successfully processed reading.
    pub fn success(
        raw: RawReading,
        processed: ProcessedResult,
        meta: SessionMeta,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            success: true,
            timestamp,
            raw: Some(raw),
            processed,
            meta: Some(meta),
            error: None,
            fallback: false,
        }
    }

    /// Envelope for a failed poll.
    pub fn fallback(error: impl Into<String>, timestamp: OffsetDateTime) -> Self {
        Self {
            success: false,
            timestamp,
            raw: None,
            processed: ProcessedResult::fallback(),
            meta: None,
            error: Some(error.into()),
            fallback: true,
        }
    }
}
