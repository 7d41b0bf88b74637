//! Event normalization
//!
//! Turns a [`RawEvent`] into exactly one [`NormalizedEvent`]. Nothing in here
//! fails: malformed payloads, amounts and timestamps degrade to defaults so a
//! single bad record never takes down a scoring run.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::literal::parse_literal;
use crate::models::{Action, NormalizedEvent, RawEvent};

/// Raw amounts are integers in a fixed 6-decimal token denomination.
pub const AMOUNT_SCALE: f64 = 1_000_000.0;

/// Normalize a single raw event.
pub fn normalize_event(raw: &RawEvent) -> NormalizedEvent {
    let payload = decode_payload(&raw.action_data);
    let amount = extract_amount(&payload);
    let timestamp = parse_timestamp(&raw.timestamp);
    let action = Action::from(raw.action.as_str());

    tracing::trace!(
        wallet = %raw.wallet,
        action = %action,
        amount,
        timestamp = %timestamp,
        "Normalized event"
    );

    NormalizedEvent::new(raw.wallet.clone(), action, amount, timestamp)
}

/// Decode an action payload into a mapping.
///
/// Structured payloads are used as-is; textual ones go through the literal
/// decoder. Anything that does not end up as a mapping is treated as empty.
pub fn decode_payload(payload: &Value) -> Map<String, Value> {
    match payload {
        Value::Object(map) => map.clone(),
        Value::String(text) => match parse_literal(text) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                tracing::debug!(kind = value_kind(&other), "Decoded payload is not a mapping");
                Map::new()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Could not decode payload text, treating as empty");
                Map::new()
            }
        },
        Value::Null => Map::new(),
        other => {
            tracing::debug!(kind = value_kind(other), "Unsupported payload type, treating as empty");
            Map::new()
        }
    }
}

/// Read `amount` from a decoded payload and scale it to whole token units.
///
/// Booleans count as 1 and 0 base units. Missing keys, non-numeric values and
/// results that are negative or not finite all yield `0.0`.
pub fn extract_amount(payload: &Map<String, Value>) -> f64 {
    let Some(raw) = payload.get("amount") else {
        return 0.0;
    };

    match coerce_f64(raw).map(|v| v / AMOUNT_SCALE) {
        Some(amount) if amount.is_finite() && amount > 0.0 => amount,
        Some(_) => 0.0,
        None => {
            tracing::debug!(amount = %raw, "Unparseable amount, defaulting to 0");
            0.0
        }
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_text(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Parse decimal text the way a float constructor would: surrounding
/// whitespace is ignored and `_` may separate digits.
fn parse_float_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.contains('_') {
        let bytes = trimmed.as_bytes();
        let separators_ok = bytes.iter().enumerate().all(|(i, b)| {
            *b != b'_'
                || (i > 0
                    && i + 1 < bytes.len()
                    && bytes[i - 1].is_ascii_digit()
                    && bytes[i + 1].is_ascii_digit())
        });
        if !separators_ok {
            return None;
        }
        return trimmed.replace('_', "").parse().ok();
    }
    trimmed.parse().ok()
}

/// Convert epoch seconds to a UTC timestamp.
///
/// Accepts integers, floats (truncated) and numeric strings. Anything else,
/// or a value outside the representable range, maps to the Unix epoch.
pub fn parse_timestamp(raw: &Value) -> DateTime<Utc> {
    let seconds = match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_seconds)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(truncate_seconds))
        }
        _ => None,
    };

    match seconds.and_then(|s| DateTime::from_timestamp(s, 0)) {
        Some(timestamp) => timestamp,
        None => {
            tracing::warn!(timestamp = %raw, "Invalid timestamp, using Unix epoch");
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

fn truncate_seconds(seconds: f64) -> Option<i64> {
    if seconds.is_finite() && seconds.abs() < i64::MAX as f64 {
        Some(seconds.trunc() as i64)
    } else {
        None
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(action: &str, action_data: Value, timestamp: Value) -> RawEvent {
        RawEvent {
            wallet: "0xabc".to_string(),
            action: action.to_string(),
            action_data,
            timestamp,
        }
    }

    #[test]
    fn test_structured_payload_amount() {
        let event = normalize_event(&raw(
            "deposit",
            json!({"amount": "2000000000", "assetSymbol": "USDC"}),
            json!(1629178166),
        ));
        assert_eq!(event.wallet, "0xabc");
        assert_eq!(event.action, Action::Deposit);
        assert_eq!(event.amount, 2000.0);
        assert_eq!(event.timestamp.timestamp(), 1629178166);
        assert!(!event.is_liquidation);
    }

    #[test]
    fn test_textual_payload_amount() {
        let event = normalize_event(&raw(
            "borrow",
            json!("{'amount': 1500000, 'poolId': '0x2791'}"),
            json!("1629178166"),
        ));
        assert_eq!(event.amount, 1.5);
        assert_eq!(event.timestamp.timestamp(), 1629178166);
    }

    #[test]
    fn test_malformed_amounts_default_to_zero() {
        let cases = [
            json!({}),
            json!({"amount": "abc"}),
            json!({"amount": null}),
            json!({"amount": [1, 2]}),
            json!({"amount": "-5000000"}),
            json!({"amount": "nan"}),
            json!("{'amount': }"),
            json!("not a literal"),
            json!([1, 2, 3]),
            json!(42),
            Value::Null,
        ];
        for payload in cases {
            let event = normalize_event(&raw("repay", payload.clone(), json!(0)));
            assert_eq!(event.amount, 0.0, "payload {payload} should yield zero");
        }
    }

    #[test]
    fn test_boolean_amount_counts_as_one_base_unit() {
        let truthy = normalize_event(&raw("deposit", json!({"amount": true}), json!(0)));
        assert_eq!(truthy.amount, 1.0 / AMOUNT_SCALE);

        let falsy = normalize_event(&raw("deposit", json!("{'amount': False}"), json!(0)));
        assert_eq!(falsy.amount, 0.0);
    }

    #[test]
    fn test_float_text_forms() {
        assert_eq!(parse_float_text("  2500000 "), Some(2_500_000.0));
        assert_eq!(parse_float_text("1e6"), Some(1_000_000.0));
        assert_eq!(parse_float_text("1_000_000"), Some(1_000_000.0));
        assert_eq!(parse_float_text("1__0"), None);
        assert_eq!(parse_float_text("_10"), None);
        assert_eq!(parse_float_text("0x10"), None);
    }

    #[test]
    fn test_liquidation_flag_is_case_sensitive() {
        let liquidation = normalize_event(&raw("liquidationcall", Value::Null, json!(0)));
        assert!(liquidation.is_liquidation);
        assert_eq!(liquidation.action, Action::LiquidationCall);

        let other = normalize_event(&raw("LiquidationCall", Value::Null, json!(0)));
        assert!(!other.is_liquidation);
        assert_eq!(other.action, Action::Other("LiquidationCall".to_string()));
    }

    #[test]
    fn test_timestamp_forms() {
        assert_eq!(parse_timestamp(&json!(1700000000)).timestamp(), 1700000000);
        assert_eq!(parse_timestamp(&json!(1700000000.9)).timestamp(), 1700000000);
        assert_eq!(parse_timestamp(&json!(" 1700000000 ")).timestamp(), 1700000000);
        assert_eq!(parse_timestamp(&json!("1700000000.5")).timestamp(), 1700000000);
        assert_eq!(parse_timestamp(&json!("yesterday")), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(parse_timestamp(&Value::Null), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(parse_timestamp(&json!(i64::MAX)), DateTime::<Utc>::UNIX_EPOCH);
    }
}
