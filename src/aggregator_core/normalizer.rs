//! Detection event normalization from raw stream payloads to the canonical Event

use crate::error::LiveError;
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};

/// Length of a synthesized identifier
const SYNTH_ID_LEN: usize = 6;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Canonical detection event.
///
/// Fully determined at construction; nothing downstream mutates it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub accident: bool,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Parse an Event from one raw stream frame.
    ///
    /// Only an unparsable outer payload is an error. Missing or partial
    /// fields fall back to defaults (`0` coordinates, `0` score, `false`
    /// accident, receipt time, synthesized id).
    pub fn from_payload(payload: &[u8], received_at: DateTime<Utc>) -> Result<Self, LiveError> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| LiveError::MalformedMessage(e.to_string()))?;

        match value {
            Value::Object(fields) => Ok(Self::from_fields(&fields, received_at)),
            other => Err(LiveError::MalformedMessage(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build an Event from an already-decoded field map
    pub fn from_fields(fields: &Map<String, Value>, received_at: DateTime<Utc>) -> Self {
        let coords = fields.get("coords").and_then(Value::as_array);
        let coord = |idx: usize| coords.and_then(|c| c.get(idx));

        let lat = first_nonzero([coord(0), fields.get("lat")]);
        let lon = first_nonzero([coord(1), fields.get("lon")]);

        // A numeric top-level score wins even when it is zero
        let score = match fields.get("score") {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            _ => first_nonzero([fields
                .get("details")
                .and_then(Value::as_object)
                .and_then(|d| d.get("score"))]),
        };

        let id = [fields.get("id"), fields.get("device_id")]
            .into_iter()
            .flatten()
            .find_map(identifier)
            .unwrap_or_else(synthesize_id);

        let timestamp = fields
            .get("ts")
            .and_then(number)
            .filter(|ts| *ts != 0.0)
            .and_then(epoch_seconds)
            .unwrap_or(received_at);

        Self {
            id,
            lat,
            lon,
            accident: fields.get("accident").map(truthy).unwrap_or(false),
            score,
            timestamp,
        }
    }
}

/// Random short token for events that arrive without an identifier.
///
/// Not globally unique: a 36^6 space with no collision check.
pub fn synthesize_id() -> String {
    let mut rng = rand::thread_rng();
    (0..SYNTH_ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Loose truthiness: null, false, 0, "" are false; everything else is true
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numbers and numeric strings
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn first_nonzero<const N: usize>(candidates: [Option<&Value>; N]) -> f64 {
    candidates
        .into_iter()
        .flatten()
        .filter_map(number)
        .find(|v| *v != 0.0)
        .unwrap_or(0.0)
}

fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if truthy(value) => Some(n.to_string()),
        _ => None,
    }
}

fn epoch_seconds(ts: f64) -> Option<DateTime<Utc>> {
    let millis = (ts * 1000.0).round();
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn received() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn parse(line: &str) -> Event {
        Event::from_payload(line.as_bytes(), received()).unwrap()
    }

    #[test]
    fn test_parse_full_api_payload() {
        let ev = parse(
            r#"{"id":"dev-17","coords":[28.61,77.20],"accident":true,"score":2.75,"ts":1763026318.5}"#,
        );
        assert_eq!(ev.id, "dev-17");
        assert_eq!(ev.lat, 28.61);
        assert_eq!(ev.lon, 77.20);
        assert!(ev.accident);
        assert_eq!(ev.score, 2.75);
        assert_eq!(ev.timestamp.timestamp_millis(), 1_763_026_318_500);
    }

    #[test]
    fn test_discrete_lat_lon_and_device_id() {
        let ev = parse(r#"{"device_id":"sim-3","lat":1.0,"lon":2.0,"accident":false,"score":4}"#);
        assert_eq!(ev.id, "sim-3");
        assert_eq!((ev.lat, ev.lon), (1.0, 2.0));
        assert!(!ev.accident);
        assert_eq!(ev.score, 4.0);
    }

    #[test]
    fn test_zero_coordinate_falls_through_to_discrete_field() {
        let ev = parse(r#"{"coords":[0,5.5],"lat":3.25,"lon":9.0}"#);
        assert_eq!(ev.lat, 3.25);
        assert_eq!(ev.lon, 5.5);
    }

    #[test]
    fn test_nested_score_used_when_top_level_missing() {
        let ev = parse(r#"{"details":{"score":-1.25}}"#);
        assert_eq!(ev.score, -1.25);

        // top-level numeric zero still wins over details
        let ev = parse(r#"{"score":0,"details":{"score":3}}"#);
        assert_eq!(ev.score, 0.0);

        // non-numeric top-level score defers to details
        let ev = parse(r#"{"score":"high","details":{"score":3}}"#);
        assert_eq!(ev.score, 3.0);
    }

    #[test]
    fn test_empty_object_degrades_to_defaults() {
        let ev = parse("{}");
        assert_eq!(ev.id.len(), SYNTH_ID_LEN);
        assert!(ev.id.bytes().all(|b| ID_ALPHABET.contains(&b)));
        assert_eq!((ev.lat, ev.lon), (0.0, 0.0));
        assert!(!ev.accident);
        assert_eq!(ev.score, 0.0);
        assert_eq!(ev.timestamp, received());
    }

    #[test]
    fn test_accident_truthiness() {
        assert!(parse(r#"{"accident":1}"#).accident);
        assert!(parse(r#"{"accident":"yes"}"#).accident);
        assert!(!parse(r#"{"accident":0}"#).accident);
        assert!(!parse(r#"{"accident":""}"#).accident);
        assert!(!parse(r#"{"accident":null}"#).accident);
    }

    #[test]
    fn test_empty_id_uses_fallback() {
        let ev = parse(r#"{"id":"","device_id":"dev-9"}"#);
        assert_eq!(ev.id, "dev-9");
        let ev = parse(r#"{"id":42}"#);
        assert_eq!(ev.id, "42");
    }

    #[test]
    fn test_zero_ts_uses_receipt_time() {
        let ev = parse(r#"{"ts":0}"#);
        assert_eq!(ev.timestamp, received());
    }

    #[test]
    fn test_malformed_payload() {
        let err = Event::from_payload(br#"{"invalid": "json"#, received()).unwrap_err();
        assert!(matches!(err, LiveError::MalformedMessage(_)));

        let err = Event::from_payload(b"null", received()).unwrap_err();
        assert!(matches!(err, LiveError::MalformedMessage(_)));

        let err = Event::from_payload(&[0xff, 0xfe, 0x00], received()).unwrap_err();
        assert!(matches!(err, LiveError::MalformedMessage(_)));
    }
}
