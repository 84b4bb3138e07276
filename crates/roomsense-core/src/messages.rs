//! Human-readable status line.
//!
//! Active channels contribute one fragment each, in the fixed order gas,
//! air, temperature, humidity, light, noise. Fragments are joined with
//! `" | "` behind a banner whose strength follows the room status. With no
//! fragment at all the line is [`STABLE_MESSAGE`].

use roomsense_types::{ChannelAlerts, Level, RawReading};

/// Status line used when nothing needs attention.
pub const STABLE_MESSAGE: &str = "✅ Room conditions are stable";

/// Banner used when the room status is Medium or worse.
pub const WARNING_BANNER: &str = "⚠️ WARNING:";

/// Banner used for milder conditions.
pub const NOTE_BANNER: &str = "ℹ️ Note:";

const FRAGMENT_SEPARATOR: &str = " | ";

/// Everything the composer looks at for one reading.
#[derive(Debug, Clone, Copy)]
pub struct MessageInput<'a> {
    /// The reading being processed.
    pub reading: &'a RawReading,
    /// Smoothed temperature.
    pub avg_temp: Option<f64>,
    /// Smoothed humidity.
    pub avg_hum: Option<f64>,
    /// Per-channel alert flags.
    pub alert: &'a ChannelAlerts,
    /// Aggregate room status.
    pub room_status: Level,
}

/// Warning fragments in display order.
pub fn fragments(input: &MessageInput<'_>) -> Vec<String> {
    let mut out = Vec::new();

    if input.alert.gas {
        out.push("🔥 Gas/smoke detected".to_string());
    }
    if input.alert.air {
        out.push(format!(
            "💨 Poor air quality: {}",
            input.reading.gas_quality_raw
        ));
    }
    if input.alert.temp
        && let Some(t) = input.avg_temp
    {
        out.push(format!("🌡️ Temperature {t:.1}°C"));
    }
    if input.alert.hum
        && let Some(h) = input.avg_hum
    {
        out.push(format!("💧 Humidity {h:.1}%"));
    }
    if input.reading.light_deficient {
        out.push("💡 Insufficient light".to_string());
    }
    if input.reading.noise_present {
        out.push("🔊 Noise detected".to_string());
    }

    out
}

/// Compose the status line.
pub fn compose(input: &MessageInput<'_>) -> String {
    let parts = fragments(input);
    if parts.is_empty() {
        return STABLE_MESSAGE.to_string();
    }

    let banner = if input.room_status >= Level::Medium {
        WARNING_BANNER
    } else {
        NOTE_BANNER
    };
    format!("{banner} {}", parts.join(FRAGMENT_SEPARATOR))
}
