//! Wire format for readings.
//!
//! A flat JSON object with exactly the keys `tvoc`, `temperature`,
//! `humidity`, `eco2` and `aqi`, emitted in that order:
//!
//! ```text
//! {"tvoc":250,"temperature":21.5,"humidity":40.25,"eco2":500,"aqi":2}
//! ```
//!
//! Unavailable fields go out as the `-1` / `-1.0` sentinel. Decoding is
//! lenient about content and strict about structure: a missing key, `null`,
//! a value of the wrong type or a sentinel all decode to "unavailable", while
//! anything that is not a JSON object is a [`DecodeError`].

use alloc::string::String;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror_no_std::Error;

use crate::{Reading, SENTINEL, SENTINEL_F};

/// Largest payload a consumer will accept
pub const MAX_PAYLOAD_LEN: usize = 512;

// Two decimal places for floating point fields
const FLOAT_SCALE: f32 = 100.0;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Payload of {0} bytes exceeds limit")]
    TooLarge(usize),
    #[error("Malformed payload at line {line} column {column}")]
    Malformed { line: usize, column: usize },
    #[error("Payload is not a flat record")]
    NotAnObject,
}

// Field order here is the order on the wire
#[derive(Serialize)]
struct WireReading {
    tvoc: i32,
    temperature: f32,
    humidity: f32,
    eco2: i32,
    aqi: i32,
}

impl From<&Reading> for WireReading {
    fn from(r: &Reading) -> Self {
        Self {
            tvoc: r.tvoc.unwrap_or(SENTINEL),
            temperature: r.temperature.map(quantize).unwrap_or(SENTINEL_F),
            humidity: r.humidity.map(quantize).unwrap_or(SENTINEL_F),
            eco2: r.eco2.unwrap_or(SENTINEL),
            aqi: r.aqi.unwrap_or(SENTINEL),
        }
    }
}

/// Round to the two decimal places carried on the wire
pub fn quantize(v: f32) -> f32 {
    libm::roundf(v * FLOAT_SCALE) / FLOAT_SCALE
}

pub fn encode(reading: &Reading) -> String {
    serde_json::to_string(&WireReading::from(reading)).unwrap_or_else(|e| {
        // only reachable if serde_json cannot allocate
        log::error!("Unable to serialize reading {e:}");
        String::from("{}")
    })
}

pub fn decode(payload: &[u8]) -> Result<Reading, DecodeError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        log::error!("Dropping {} byte payload", payload.len());
        return Err(DecodeError::TooLarge(payload.len()));
    }

    let value: Value = serde_json::from_slice(payload).map_err(|e| {
        log::error!("Deserde error {e:} len {:?}", payload.len());
        DecodeError::Malformed {
            line: e.line(),
            column: e.column(),
        }
    })?;

    let record = match value {
        Value::Object(map) => map,
        other => {
            log::error!("Expected a flat record, got {other:}");
            return Err(DecodeError::NotAnObject);
        }
    };

    let reading = Reading {
        tvoc: int_field(&record, "tvoc"),
        eco2: int_field(&record, "eco2"),
        aqi: int_field(&record, "aqi"),
        temperature: float_field(&record, "temperature"),
        humidity: float_field(&record, "humidity"),
    };
    log::debug!("Parsed {reading:}");
    Ok(reading)
}

fn int_field(record: &Map<String, Value>, key: &str) -> Option<i32> {
    let raw = match record.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::Null => return None,
        other => {
            log::warn!("Ignoring non-numeric {key:} value {other:}");
            return None;
        }
    };
    i32::try_from(raw).ok().filter(|v| *v >= 0)
}

fn float_field(record: &Map<String, Value>, key: &str) -> Option<f32> {
    let raw = match record.get(key)? {
        Value::Number(n) => n.as_f64()? as f32,
        Value::Null => return None,
        other => {
            log::warn!("Ignoring non-numeric {key:} value {other:}");
            return None;
        }
    };
    (raw.is_finite() && raw != SENTINEL_F).then_some(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_fixed_keys_in_order() {
        let r = Reading {
            tvoc: Some(250),
            eco2: Some(500),
            aqi: Some(2),
            temperature: Some(21.5),
            humidity: Some(40.25),
        };
        assert_eq!(
            encode(&r),
            r#"{"tvoc":250,"temperature":21.5,"humidity":40.25,"eco2":500,"aqi":2}"#
        );
    }

    #[test]
    fn unavailable_fields_go_out_as_sentinels() {
        assert_eq!(
            encode(&Reading::default()),
            r#"{"tvoc":-1,"temperature":-1.0,"humidity":-1.0,"eco2":-1,"aqi":-1}"#
        );
    }

    #[test]
    fn floats_are_rounded_to_two_places() {
        let r = Reading {
            temperature: Some(23.456_78),
            humidity: Some(51.004),
            ..Reading::default()
        };
        let decoded = decode(encode(&r).as_bytes()).unwrap();
        assert_eq!(decoded.temperature, Some(23.46));
        assert_eq!(decoded.humidity, Some(51.0));
    }

    #[test]
    fn temperature_rounding_onto_sentinel_reads_as_unavailable() {
        // -1.00 C cannot be told apart from a missing value once on the wire
        for t in [-1.0, -0.996, -1.004] {
            let r = Reading {
                temperature: Some(t),
                humidity: Some(30.0),
                ..Reading::default()
            };
            let text = encode(&r);
            assert!(text.contains(r#""temperature":-1.0"#), "{text}");
            let decoded = decode(text.as_bytes()).unwrap();
            assert_eq!(decoded.temperature, None);
            assert_eq!(decoded.humidity, Some(30.0));
        }

        // one hundredth away survives
        let r = Reading {
            temperature: Some(-0.99),
            ..Reading::default()
        };
        assert_eq!(decode(encode(&r).as_bytes()).unwrap().temperature, Some(-0.99));
    }

    #[test]
    fn missing_keys_decode_as_unavailable() {
        let r = decode(br#"{"tvoc": 300}"#).unwrap();
        assert_eq!(r.tvoc, Some(300));
        assert_eq!(r.eco2, None);
        assert_eq!(r.aqi, None);
        assert_eq!(r.temperature, None);
        assert_eq!(r.humidity, None);

        assert!(decode(b"{}").unwrap().is_empty());
    }

    #[test]
    fn sentinels_and_nulls_decode_as_unavailable() {
        let r = decode(
            br#"{"tvoc":-1,"temperature":-1.0,"humidity":null,"eco2":-1,"aqi":-1}"#,
        )
        .unwrap();
        assert!(r.is_empty());
    }

    #[test]
    fn tolerates_legacy_and_extra_fields() {
        // older publishers sent tvoc as a float and a timestamp
        let r = decode(
            br#"{"tvoc": 1.75, "temperature": 27.3, "humidity": 61.2, "timestamp": "2024-01-01T00:00:00"}"#,
        )
        .unwrap();
        assert_eq!(r.tvoc, Some(1));
        assert_eq!(r.temperature, Some(27.3));
        assert_eq!(r.aqi, None);

        let r = decode(br#"{"aqi": "bad", "eco2": 900}"#).unwrap();
        assert_eq!(r.aqi, None);
        assert_eq!(r.eco2, Some(900));
    }

    #[test]
    fn malformed_records_are_rejected() {
        assert!(matches!(
            decode(br#"{"tvoc": 12,"#),
            Err(DecodeError::Malformed { .. })
        ));
        assert!(matches!(decode(b""), Err(DecodeError::Malformed { .. })));
        assert_eq!(decode(b"[1, 2, 3]"), Err(DecodeError::NotAnObject));
        assert_eq!(decode(b"42"), Err(DecodeError::NotAnObject));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let big = alloc::vec![b' '; MAX_PAYLOAD_LEN + 1];
        assert_eq!(decode(&big), Err(DecodeError::TooLarge(MAX_PAYLOAD_LEN + 1)));
    }
}
