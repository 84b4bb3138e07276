//! Validation of raw device payloads.
//!
//! The device sends one JSON object per poll, in one of two shapes:
//!
//! - **basic**: `temp`, `hum` (number or null, always together), `mq135`
//!   (raw gas quality), `light`, `sound`, `mq2` (0/1),
//! - **extended**: recognised by `dht_ok`. The raw gas quality moves to
//!   `mq135_value` and `mq135` becomes the device's own alert flag; the
//!   payload adds the raw analog values and per-sensor messages.
//!
//! Nothing is defaulted: a missing or mistyped field is reported with its
//! wire name and the reading is rejected before it reaches a session.
//!
//! # Example
//!
//! ```
//! use roomsense_core::validation::parse_reading_str;
//!
//! let reading = parse_reading_str(
//!     r#"{"temp": 24.5, "hum": 50, "mq135": 120, "light": 0, "sound": 1, "mq2": 0}"#,
//! ).unwrap();
//! assert_eq!(reading.temperature(), Some(24.5));
//! assert!(reading.noise_present);
//!
//! let err = parse_reading_str(r#"{"temp": null, "hum": null, "light": 0}"#).unwrap_err();
//! assert_eq!(err.field(), Some("mq135"));
//! ```

use serde_json::{Map, Value};

use roomsense_types::{Climate, ParseError, ParseResult, Provenance, RawReading};

type Object = Map<String, Value>;

/// Validate a decoded JSON payload.
pub fn parse_reading(value: &Value) -> ParseResult<RawReading> {
    let obj = value.as_object().ok_or(ParseError::NotAnObject)?;

    if obj.contains_key("dht_ok") {
        parse_extended(obj)
    } else {
        parse_basic(obj)
    }
}

/// Decode and validate a JSON payload.
pub fn parse_reading_str(text: &str) -> ParseResult<RawReading> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    parse_reading(&value)
}

fn parse_basic(obj: &Object) -> ParseResult<RawReading> {
    let temp = optional_number(obj, "temp")?;
    let hum = optional_number(obj, "hum")?;
    let climate = match (temp, hum) {
        (Some(temperature), Some(humidity)) => Some(Climate {
            temperature,
            humidity,
        }),
        (None, None) => None,
        (Some(_), None) => {
            return Err(ParseError::InconsistentFields {
                present: "temp",
                missing: "hum",
            });
        }
        (None, Some(_)) => {
            return Err(ParseError::InconsistentFields {
                present: "hum",
                missing: "temp",
            });
        }
    };

    Ok(RawReading {
        climate,
        gas_quality_raw: gas_raw(obj, "mq135")?,
        light_deficient: flag(obj, "light")?,
        noise_present: flag(obj, "sound")?,
        gas_or_smoke_detected: flag(obj, "mq2")?,
        provenance: None,
    })
}

fn parse_extended(obj: &Object) -> ParseResult<RawReading> {
    let dht_ok = flag(obj, "dht_ok")?;
    // A faulted climate sensor may still report stale numbers; they are ignored.
    let climate = if dht_ok {
        Some(Climate {
            temperature: number(obj, "temp")?,
            humidity: number(obj, "hum")?,
        })
    } else {
        None
    };

    let provenance = Provenance {
        dht_ok,
        light_value: number(obj, "light_value")?,
        sound_value: number(obj, "sound_value")?,
        mq2_value: number(obj, "mq2_value")?,
        mq135_alert: flag(obj, "mq135")?,
        sound_msg: optional_string(obj, "sound_msg")?,
        light_msg: optional_string(obj, "light_msg")?,
        mq2_msg: optional_string(obj, "mq2_msg")?,
        mq135_msg: optional_string(obj, "mq135_msg")?,
        dht_msg: optional_string(obj, "dht_msg")?,
    };

    Ok(RawReading {
        climate,
        gas_quality_raw: gas_raw(obj, "mq135_value")?,
        light_deficient: flag(obj, "light")?,
        noise_present: flag(obj, "sound")?,
        gas_or_smoke_detected: flag(obj, "mq2")?,
        provenance: Some(provenance),
    })
}

fn required<'a>(obj: &'a Object, field: &'static str) -> ParseResult<&'a Value> {
    obj.get(field).ok_or(ParseError::MissingField { field })
}

fn invalid_type(field: &'static str, expected: &'static str, actual: &Value) -> ParseError {
    ParseError::InvalidType {
        field,
        expected,
        actual: actual.to_string(),
    }
}

fn number(obj: &Object, field: &'static str) -> ParseResult<f64> {
    let value = required(obj, field)?;
    value
        .as_f64()
        .ok_or_else(|| invalid_type(field, "a number", value))
}

fn optional_number(obj: &Object, field: &'static str) -> ParseResult<Option<f64>> {
    let value = required(obj, field)?;
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_f64()
        .map(Some)
        .ok_or_else(|| invalid_type(field, "a number or null", value))
}

fn gas_raw(obj: &Object, field: &'static str) -> ParseResult<u32> {
    let value = required(obj, field)?;
    let out_of_range = || ParseError::OutOfRange {
        field,
        value: value.to_string(),
    };

    if let Some(raw) = value.as_u64() {
        return u32::try_from(raw).map_err(|_| out_of_range());
    }
    match value.as_f64() {
        Some(raw) if raw < 0.0 => Err(out_of_range()),
        Some(raw) if raw.fract() == 0.0 && raw <= f64::from(u32::MAX) => Ok(raw as u32),
        Some(raw) if raw.fract() == 0.0 => Err(out_of_range()),
        _ => Err(invalid_type(field, "a non-negative integer", value)),
    }
}

fn flag(obj: &Object, field: &'static str) -> ParseResult<bool> {
    let value = required(obj, field)?;
    if let Some(b) = value.as_bool() {
        return Ok(b);
    }
    match value.as_f64() {
        Some(n) if n == 0.0 => Ok(false),
        Some(n) if n == 1.0 => Ok(true),
        Some(_) => Err(ParseError::OutOfRange {
            field,
            value: value.to_string(),
        }),
        None => Err(invalid_type(field, "0, 1 or a boolean", value)),
    }
}

fn optional_string(obj: &Object, field: &'static str) -> ParseResult<Option<String>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid_type(field, "a string", other)),
    }
}
