//! Room status and comfort index.
//!
//! The comfort index starts at 100 and loses a fixed number of points per
//! level of each channel:
//!
//! | Channel | Points per level |
//! |---------|------------------|
//! | Temperature | 15 |
//! | Humidity | 15 |
//! | Air quality | 20 |
//! | Light | 5 |
//! | Noise | 5 |
//! | Gas/smoke | 30 |
//!
//! The result is clamped to `0..=100`. The dashboard colours the index with
//! the buckets of [`comfort_level`].

use roomsense_types::{ChannelLevels, Level};

/// Aggregate severity of the danger-relevant channels.
///
/// Gas/smoke detection always wins. Otherwise the worst of temperature,
/// humidity and air quality; light and noise never take part.
pub fn room_status(levels: &ChannelLevels) -> Level {
    if levels.gas == Level::Dangerous {
        return Level::Dangerous;
    }
    levels.temp.max(levels.hum).max(levels.air)
}

/// Weighted-penalty comfort score in `0..=100`.
pub fn comfort_index(levels: &ChannelLevels) -> u8 {
    let penalty = u32::from(levels.temp.value()) * 15
        + u32::from(levels.hum.value()) * 15
        + u32::from(levels.air.value()) * 20
        + u32::from(levels.light.value()) * 5
        + u32::from(levels.noise.value()) * 5
        + u32::from(levels.gas.value()) * 30;
    100u32.saturating_sub(penalty) as u8
}

/// Map a comfort index onto the dashboard's colour bucket.
///
/// ```
/// use roomsense_core::comfort::comfort_level;
/// use roomsense_types::Level;
///
/// assert_eq!(comfort_level(100), Level::Good);
/// assert_eq!(comfort_level(79), Level::Normal);
/// assert_eq!(comfort_level(0), Level::Dangerous);
/// ```
pub fn comfort_level(index: u8) -> Level {
    match index {
        80.. => Level::Good,
        60..=79 => Level::Normal,
        40..=59 => Level::Medium,
        20..=39 => Level::Bad,
        _ => Level::Dangerous,
    }
}
