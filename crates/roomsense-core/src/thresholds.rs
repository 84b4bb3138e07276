//! Per-channel severity bands.
//!
//! Every function here is pure: the same input always yields the same
//! [`Level`]. Continuous channels are classified from their smoothed mean,
//! except air quality which uses the latest raw value.
//!
//! # Example
//!
//! ```
//! use roomsense_core::thresholds::{classify_air_quality, classify_temperature};
//! use roomsense_types::Level;
//!
//! assert_eq!(classify_temperature(Some(22.0)), Level::Good);
//! assert_eq!(classify_temperature(Some(38.5)), Level::Dangerous);
//! assert_eq!(classify_temperature(None), Level::Good);
//! assert_eq!(classify_air_quality(450), Level::Medium);
//! ```

use roomsense_types::{Channel, Level};

/// Raw gas-quality bounds: `[Normal, Medium, Bad, Dangerous]` lower edges.
pub const AIR_QUALITY_BANDS: [u32; 4] = [300, 450, 600, 800];

/// Classify a smoothed temperature in °C.
///
/// | Range | Level |
/// |-------|-------|
/// | 22 ..= 28 | Good |
/// | 18 .. 22, 28 <.. 32 | Normal |
/// | 15 .. 18, 32 <.. 38 | Bad |
/// | below 15 or above 38 | Dangerous |
///
/// There is no Medium band for temperature. A missing value is Good.
pub fn classify_temperature(value: Option<f64>) -> Level {
    let Some(t) = value else {
        return Level::Good;
    };
    if (22.0..=28.0).contains(&t) {
        Level::Good
    } else if (18.0..22.0).contains(&t) || (t > 28.0 && t <= 32.0) {
        Level::Normal
    } else if (15.0..18.0).contains(&t) || (t > 32.0 && t <= 38.0) {
        Level::Bad
    } else {
        Level::Dangerous
    }
}

/// Classify a smoothed relative humidity in %.
///
/// Humidity alone never reaches [`Level::Dangerous`]; anything outside
/// 20..=90 is [`Level::Bad`]. A missing value is Good.
pub fn classify_humidity(value: Option<f64>) -> Level {
    let Some(h) = value else {
        return Level::Good;
    };
    if (40.0..=60.0).contains(&h) {
        Level::Good
    } else if (30.0..40.0).contains(&h) || (h > 60.0 && h <= 80.0) {
        Level::Normal
    } else if (20.0..30.0).contains(&h) || (h > 80.0 && h <= 90.0) {
        Level::Medium
    } else {
        Level::Bad
    }
}

/// Classify the latest raw gas-quality value.
pub fn classify_air_quality(raw: u32) -> Level {
    let [normal, medium, bad, dangerous] = AIR_QUALITY_BANDS;
    match raw {
        r if r >= dangerous => Level::Dangerous,
        r if r >= bad => Level::Bad,
        r if r >= medium => Level::Medium,
        r if r >= normal => Level::Normal,
        _ => Level::Good,
    }
}

/// Light deficiency is informational only.
pub fn classify_light(deficient: bool) -> Level {
    if deficient { Level::Normal } else { Level::Good }
}

/// Noise is informational only.
pub fn classify_noise(present: bool) -> Level {
    if present { Level::Normal } else { Level::Good }
}

/// Gas/smoke detection is always dangerous.
pub fn classify_gas_smoke(detected: bool) -> Level {
    if detected {
        Level::Dangerous
    } else {
        Level::Good
    }
}

/// Input to the generic [`classify`] entry point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelInput {
    /// Smoothed or raw value of a continuous channel.
    Continuous(Option<f64>),
    /// State of a binary indicator.
    Indicator(bool),
}

/// Classify any channel.
///
/// A continuous value given for a binary channel counts as active when
/// non-zero; an indicator given for a continuous channel is treated as
/// missing data and yields [`Level::Good`].
pub fn classify(channel: Channel, input: ChannelInput) -> Level {
    match (channel, input) {
        (Channel::Temperature, ChannelInput::Continuous(v)) => classify_temperature(v),
        (Channel::Humidity, ChannelInput::Continuous(v)) => classify_humidity(v),
        (Channel::AirQuality, ChannelInput::Continuous(v)) => {
            classify_air_quality(v.map_or(0, |raw| raw.round().max(0.0) as u32))
        }
        (_, ChannelInput::Indicator(_)) if channel.is_continuous() => Level::Good,
        (_, ChannelInput::Indicator(active)) => classify_indicator(channel, active),
        (_, ChannelInput::Continuous(v)) => {
            classify_indicator(channel, v.is_some_and(|raw| raw != 0.0))
        }
    }
}

fn classify_indicator(channel: Channel, active: bool) -> Level {
    match channel {
        Channel::Light => classify_light(active),
        Channel::Noise => classify_noise(active),
        _ => classify_gas_smoke(active),
    }
}

/// Lowest level at which a channel raises its alert flag.
///
/// Light and noise never alert; gas/smoke alerts only on detection.
pub fn alert_threshold(channel: Channel) -> Option<Level> {
    match channel {
        Channel::Temperature | Channel::Humidity | Channel::AirQuality => Some(Level::Bad),
        Channel::GasSmoke => Some(Level::Dangerous),
        Channel::Light | Channel::Noise => None,
    }
}

/// Whether `level` raises the alert flag of `channel`.
pub fn is_alert(channel: Channel, level: Level) -> bool {
    alert_threshold(channel).is_some_and(|threshold| level >= threshold)
}
