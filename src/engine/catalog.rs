//! Serialization Catalog - string ↔ value conversion per field type.
//!
//! Conversions never fail: a malformed numeric attribute never
//! raises, it becomes whatever the numeric prefix parse yields, including the
//! `NaN` sentinel. Booleans follow attribute-presence semantics: any present
//! attribute string reads as `true`, an absent attribute reads as `false`.

use crate::types::{FieldType, Value};

// =============================================================================
// Serialize
// =============================================================================

/// Canonical string form of a value, as written to the attribute surface.
pub fn serialize(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => format_float(*v),
        Value::Bool(v) => v.to_string(),
        Value::Str(v) => v.clone(),
    }
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        // Shortest round-trip form; integral floats print without ".0"
        format!("{v}")
    }
}

// =============================================================================
// Deserialize
// =============================================================================

/// Read an attribute string (or its absence) as a value of `ty`.
pub fn deserialize(attr: Option<&str>, ty: FieldType) -> Value {
    match ty {
        FieldType::Integer => attr.map_or(Value::Float(f64::NAN), parse_int),
        FieldType::Float => Value::Float(attr.map_or(f64::NAN, parse_float)),
        FieldType::Boolean => Value::Bool(attr.is_some()),
        FieldType::String | FieldType::Untyped => {
            attr.map_or(Value::Null, |s| Value::Str(s.to_string()))
        }
    }
}

/// Base-10 prefix parse: `"12px"` → `12`, `"px"` → `NaN`.
fn parse_int(attr: &str) -> Value {
    let s = attr.trim_start();
    let bytes = s.as_bytes();
    let sign_len = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = bytes[sign_len..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return Value::Float(f64::NAN);
    }

    let literal = &s[..sign_len + digits];
    match literal.parse::<i64>() {
        Ok(v) => Value::Int(v),
        // Out of i64 range: keep the magnitude as a float
        Err(_) => Value::Float(literal.parse::<f64>().unwrap_or(f64::NAN)),
    }
}

/// Decimal prefix parse with optional fraction and exponent.
fn parse_float(attr: &str) -> f64 {
    let s = attr.trim_start();
    let bytes = s.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let negative = bytes.first() == Some(&b'-');

    if s[end..].starts_with("Infinity") {
        return if negative { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end.min(bytes.len())..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn round_trip(value: Value, ty: FieldType) -> Value {
        deserialize(Some(&serialize(&value)), ty)
    }

    #[test]
    fn test_integer_round_trip() {
        for v in [0i64, 42, -7, i64::MAX, i64::MIN] {
            assert_eq!(round_trip(Value::Int(v), FieldType::Integer), Value::Int(v));
        }
    }

    #[test]
    fn test_float_round_trip() {
        for v in [0.5, -3.25, 1e-7, 1.0e300, 42.0, 0.1 + 0.2] {
            assert_eq!(round_trip(Value::Float(v), FieldType::Float), Value::Float(v));
        }
        let inf = round_trip(Value::Float(f64::INFINITY), FieldType::Float);
        assert_eq!(inf, Value::Float(f64::INFINITY));
    }

    #[test]
    fn test_string_round_trip() {
        for s in ["", "hello", "with spaces", "42"] {
            assert_eq!(round_trip(Value::from(s), FieldType::String), Value::from(s));
        }
    }

    fn finite_or_infinite() -> impl Strategy<Value = f64> {
        prop_oneof![
            8 => any::<f64>().prop_filter("finite", |v| v.is_finite()),
            1 => Just(f64::INFINITY),
            1 => Just(f64::NEG_INFINITY),
        ]
    }

    proptest! {
        #[test]
        fn integer_survives_round_trip(v in any::<i64>()) {
            prop_assert_eq!(round_trip(Value::Int(v), FieldType::Integer), Value::Int(v));
        }

        #[test]
        fn float_survives_round_trip(v in finite_or_infinite()) {
            prop_assert_eq!(round_trip(Value::Float(v), FieldType::Float), Value::Float(v));
        }

        #[test]
        fn string_survives_round_trip(s in any::<String>()) {
            let value = Value::from(s.as_str());
            prop_assert_eq!(round_trip(value.clone(), FieldType::String), value);
            prop_assert_eq!(deserialize(Some(&s), FieldType::Untyped), Value::Str(s.clone()));
        }

        #[test]
        fn any_present_attribute_reads_true(s in any::<String>()) {
            prop_assert_eq!(deserialize(Some(&s), FieldType::Boolean), Value::Bool(true));
        }
    }

    #[test]
    fn test_boolean_is_presence_based() {
        assert_eq!(deserialize(Some("false"), FieldType::Boolean), Value::Bool(true));
        assert_eq!(deserialize(Some(""), FieldType::Boolean), Value::Bool(true));
        assert_eq!(deserialize(None, FieldType::Boolean), Value::Bool(false));
    }

    #[test]
    fn test_integer_prefix_parse() {
        assert_eq!(deserialize(Some("12px"), FieldType::Integer), Value::Int(12));
        assert_eq!(deserialize(Some("  -3"), FieldType::Integer), Value::Int(-3));
        assert_eq!(deserialize(Some("4.9"), FieldType::Integer), Value::Int(4));
    }

    #[test]
    fn test_malformed_numbers_yield_nan() {
        let int = deserialize(Some("abc"), FieldType::Integer);
        assert!(int.as_f64().is_some_and(f64::is_nan));

        let float = deserialize(Some("."), FieldType::Float);
        assert!(float.as_f64().is_some_and(f64::is_nan));

        let absent = deserialize(None, FieldType::Float);
        assert!(absent.as_f64().is_some_and(f64::is_nan));
    }

    #[test]
    fn test_float_prefix_parse() {
        assert_eq!(deserialize(Some("3.5em"), FieldType::Float), Value::Float(3.5));
        assert_eq!(deserialize(Some(".5"), FieldType::Float), Value::Float(0.5));
        assert_eq!(deserialize(Some("2e3x"), FieldType::Float), Value::Float(2000.0));
        assert_eq!(deserialize(Some("2e"), FieldType::Float), Value::Float(2.0));
        assert_eq!(deserialize(Some("7."), FieldType::Float), Value::Float(7.0));
    }

    #[test]
    fn test_untyped_passes_raw_string() {
        assert_eq!(deserialize(Some("12"), FieldType::Untyped), Value::from("12"));
        assert_eq!(deserialize(None, FieldType::Untyped), Value::Null);
    }

    #[test]
    fn test_serialize_forms() {
        assert_eq!(serialize(&Value::Null), "null");
        assert_eq!(serialize(&Value::Bool(false)), "false");
        assert_eq!(serialize(&Value::Float(42.0)), "42");
        assert_eq!(serialize(&Value::Float(f64::NAN)), "NaN");
        assert_eq!(serialize(&Value::Float(f64::NEG_INFINITY)), "-Infinity");
    }
}
