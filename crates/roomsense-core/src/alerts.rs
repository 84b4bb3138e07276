//! Single-slot danger notifications.
//!
//! At most one danger notification is active at a time. It is identified by
//! its [`DangerKey`]:
//!
//! - the same key while active is suppressed,
//! - a different key replaces the active notification,
//! - no qualifying danger clears it.
//!
//! # Example
//!
//! ```
//! use roomsense_core::alerts::{AlertTracker, AlertTransition, Danger};
//! use roomsense_types::RawReading;
//! use time::OffsetDateTime;
//!
//! let mut tracker = AlertTracker::new();
//! let now = OffsetDateTime::now_utc();
//!
//! let smoky = RawReading::new(None, 100).with_gas_smoke(true);
//! let first = tracker.observe(Danger::evaluate(&smoky), now);
//! assert!(matches!(first, AlertTransition::Raised(_)));
//!
//! let again = tracker.observe(Danger::evaluate(&smoky), now);
//! assert_eq!(again, AlertTransition::Suppressed);
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use roomsense_types::RawReading;

/// Lowest comfortable temperature before a notification, °C.
pub const DANGER_TEMP_MIN: f64 = 15.0;
/// Highest comfortable temperature before a notification, °C.
pub const DANGER_TEMP_MAX: f64 = 38.0;
/// Raw gas-quality value that must be exceeded for a notification.
pub const DANGER_GAS_RAW: u32 = 800;

/// Cause of a danger notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DangerKey {
    /// Gas or smoke detected.
    Gas,
    /// Temperature outside the safe band.
    Temp,
    /// Gas-quality reading too high.
    Air,
}

impl fmt::Display for DangerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DangerKey::Gas => write!(f, "gas"),
            DangerKey::Temp => write!(f, "temp"),
            DangerKey::Air => write!(f, "air"),
        }
    }
}

/// A qualifying danger condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Danger {
    pub key: DangerKey,
    pub title: String,
    pub message: String,
}

impl Danger {
    /// Evaluate a raw reading, highest-priority cause first.
    pub fn evaluate(reading: &RawReading) -> Option<Self> {
        if reading.gas_or_smoke_detected {
            return Some(Self::new(
                DangerKey::Gas,
                "Gas or smoke detected! Ventilate and leave the room.".to_string(),
            ));
        }

        if let Some(t) = reading.temperature()
            && !(DANGER_TEMP_MIN..=DANGER_TEMP_MAX).contains(&t)
        {
            return Some(Self::new(
                DangerKey::Temp,
                format!("Abnormal temperature: {t:.1}°C"),
            ));
        }

        if reading.gas_quality_raw > DANGER_GAS_RAW {
            return Some(Self::new(
                DangerKey::Air,
                format!(
                    "Air quality is very poor: {} (raw)",
                    reading.gas_quality_raw
                ),
            ));
        }

        None
    }

    fn new(key: DangerKey, message: String) -> Self {
        Self {
            key,
            title: "🚨 DANGER".to_string(),
            message,
        }
    }
}

/// The notification currently on display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveAlert {
    #[serde(flatten)]
    pub danger: Danger,
    /// When this notification was raised.
    #[serde(with = "time::serde::rfc3339")]
    pub raised_at: OffsetDateTime,
}

/// Outcome of one [`AlertTracker::observe`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertTransition {
    /// A notification appeared where none was shown.
    Raised(Danger),
    /// A different danger took over the slot.
    Replaced {
        /// Key of the notification that was displaced.
        previous: DangerKey,
        /// The new danger.
        current: Danger,
    },
    /// Same danger as the one already shown (or acknowledged).
    Suppressed,
    /// The danger went away.
    Cleared(DangerKey),
    /// Nothing shown and nothing to show.
    Idle,
}

impl AlertTransition {
    /// Whether this transition puts a new notification on screen.
    pub fn is_shown(&self) -> bool {
        matches!(self, Self::Raised(_) | Self::Replaced { .. })
    }
}

/// Deduplicating holder of the single notification slot.
#[derive(Debug, Clone, Default)]
pub struct AlertTracker {
    active: Option<ActiveAlert>,
    acknowledged: Option<DangerKey>,
    shown_count: u64,
}

impl AlertTracker {
    /// Create a tracker with nothing displayed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest danger evaluation.
    pub fn observe(&mut self, danger: Option<Danger>, at: OffsetDateTime) -> AlertTransition {
        let Some(danger) = danger else {
            self.acknowledged = None;
            return match self.active.take() {
                Some(previous) => {
                    info!("Danger cleared: {}", previous.danger.key);
                    AlertTransition::Cleared(previous.danger.key)
                }
                None => AlertTransition::Idle,
            };
        };

        let current_key = self
            .active
            .as_ref()
            .map(|a| a.danger.key)
            .or(self.acknowledged);

        match current_key {
            Some(key) if key == danger.key => {
                debug!("Danger '{}' already notified", key);
                AlertTransition::Suppressed
            }
            previous => {
                warn!("{}: {}", danger.title, danger.message);
                self.acknowledged = None;
                self.shown_count += 1;
                self.active = Some(ActiveAlert {
                    danger: danger.clone(),
                    raised_at: at,
                });
                match previous {
                    Some(previous) => AlertTransition::Replaced {
                        previous,
                        current: danger,
                    },
                    None => AlertTransition::Raised(danger),
                }
            }
        }
    }

    /// Hide the active notification.
    ///
    /// The same danger stays acknowledged and is not shown again until it
    /// clears or a different danger takes over. Returns the dismissed key.
    pub fn dismiss(&mut self) -> Option<DangerKey> {
        let key = self.active.take()?.danger.key;
        self.acknowledged = Some(key);
        info!("Danger '{}' dismissed", key);
        Some(key)
    }

    /// The notification on display.
    pub fn active(&self) -> Option<&ActiveAlert> {
        self.active.as_ref()
    }

    /// Key of a dismissed danger that is still present.
    pub fn acknowledged(&self) -> Option<DangerKey> {
        self.acknowledged
    }

    /// Notifications shown since creation or the last reset.
    pub fn shown_count(&self) -> u64 {
        self.shown_count
    }

    /// Forget all state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const AT: OffsetDateTime = datetime!(2026-03-01 12:00 UTC);

    fn gas() -> RawReading {
        RawReading::new(Some((24.0, 50.0)), 100).with_gas_smoke(true)
    }

    fn hot() -> RawReading {
        RawReading::new(Some((39.0, 50.0)), 100)
    }

    fn calm() -> RawReading {
        RawReading::new(Some((24.0, 50.0)), 100)
    }

    #[test]
    fn test_evaluate_priority() {
        let everything = RawReading::new(Some((45.0, 50.0)), 2000).with_gas_smoke(true);
        assert_eq!(Danger::evaluate(&everything).unwrap().key, DangerKey::Gas);

        let hot_and_dirty = RawReading::new(Some((45.0, 50.0)), 2000);
        assert_eq!(Danger::evaluate(&hot_and_dirty).unwrap().key, DangerKey::Temp);

        let dirty = RawReading::new(Some((24.0, 50.0)), 801);
        let danger = Danger::evaluate(&dirty).unwrap();
        assert_eq!(danger.key, DangerKey::Air);
        assert!(danger.message.contains("801"));
    }

    #[test]
    fn test_evaluate_boundaries() {
        assert!(Danger::evaluate(&RawReading::new(Some((15.0, 50.0)), 800)).is_none());
        assert!(Danger::evaluate(&RawReading::new(Some((38.0, 50.0)), 0)).is_none());
        assert!(Danger::evaluate(&RawReading::new(Some((14.9, 50.0)), 0)).is_some());
        // A faulted climate sensor never raises a temperature danger.
        assert!(Danger::evaluate(&RawReading::new(None, 0)).is_none());
    }

    #[test]
    fn test_deduplication_sequence() {
        let mut tracker = AlertTracker::new();
        let sequence = [gas(), gas(), gas(), hot(), hot(), calm()];

        let transitions: Vec<_> = sequence
            .iter()
            .map(|r| tracker.observe(Danger::evaluate(r), AT))
            .collect();

        assert_eq!(transitions.iter().filter(|t| t.is_shown()).count(), 2);
        assert!(matches!(transitions[0], AlertTransition::Raised(_)));
        assert_eq!(transitions[1], AlertTransition::Suppressed);
        assert_eq!(transitions[2], AlertTransition::Suppressed);
        assert!(matches!(
            transitions[3],
            AlertTransition::Replaced {
                previous: DangerKey::Gas,
                ..
            }
        ));
        assert_eq!(transitions[4], AlertTransition::Suppressed);
        assert_eq!(transitions[5], AlertTransition::Cleared(DangerKey::Temp));
        assert!(tracker.active().is_none());
        assert_eq!(tracker.shown_count(), 2);
    }

    #[test]
    fn test_idle_without_danger() {
        let mut tracker = AlertTracker::new();
        assert_eq!(tracker.observe(None, AT), AlertTransition::Idle);
        assert_eq!(tracker.shown_count(), 0);
    }

    #[test]
    fn test_dismiss_keeps_same_key_quiet() {
        let mut tracker = AlertTracker::new();
        tracker.observe(Danger::evaluate(&gas()), AT);

        assert_eq!(tracker.dismiss(), Some(DangerKey::Gas));
        assert!(tracker.active().is_none());
        assert_eq!(tracker.acknowledged(), Some(DangerKey::Gas));

        // Still smoky: stays dismissed.
        assert_eq!(
            tracker.observe(Danger::evaluate(&gas()), AT),
            AlertTransition::Suppressed
        );
        assert!(tracker.active().is_none());

        // A different danger is shown again.
        assert!(tracker.observe(Danger::evaluate(&hot()), AT).is_shown());
        assert_eq!(tracker.shown_count(), 2);
    }

    #[test]
    fn test_dismiss_is_forgotten_once_clear() {
        let mut tracker = AlertTracker::new();
        tracker.observe(Danger::evaluate(&gas()), AT);
        tracker.dismiss();

        assert_eq!(tracker.observe(None, AT), AlertTransition::Idle);
        assert_eq!(tracker.acknowledged(), None);
        assert!(matches!(
            tracker.observe(Danger::evaluate(&gas()), AT),
            AlertTransition::Raised(_)
        ));
    }

    #[test]
    fn test_dismiss_with_nothing_active() {
        let mut tracker = AlertTracker::new();
        assert_eq!(tracker.dismiss(), None);
    }

    #[test]
    fn test_reset() {
        let mut tracker = AlertTracker::new();
        tracker.observe(Danger::evaluate(&gas()), AT);
        tracker.reset();
        assert!(tracker.active().is_none());
        assert_eq!(tracker.shown_count(), 0);
    }

    #[test]
    fn test_active_alert_serialization() {
        let mut tracker = AlertTracker::new();
        tracker.observe(Danger::evaluate(&gas()), AT);
        let json = serde_json::to_value(tracker.active().unwrap()).unwrap();
        assert_eq!(json["key"], "gas");
        assert_eq!(json["title"], "🚨 DANGER");
        assert!(json["raised_at"].as_str().unwrap().starts_with("2026-03-01T12:00"));
    }
}
