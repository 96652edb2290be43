//! Shared value helpers: JSON type names, structural equality, and numeric
//! comparison across the integer/float split.

use std::cmp::Ordering;

use num_cmp::NumCmp;
use serde_json::{Number, Value};

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `an integer`, `a string`, … for error messages.
pub(crate) fn with_article(type_name: &str) -> String {
    match type_name {
        "integer" | "object" | "array" => format!("an {type_name}"),
        _ => format!("a {type_name}"),
    }
}

/// A JSON number counts as an integer when it equals its floor, so `1.0`
/// satisfies `type: integer`.
pub(crate) fn is_integer(number: &Number) -> bool {
    number.is_i64()
        || number.is_u64()
        || number
            .as_f64()
            .is_some_and(|float| float.is_finite() && float == float.trunc())
}

enum Numeric {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

fn numeric(number: &Number) -> Numeric {
    if let Some(unsigned) = number.as_u64() {
        Numeric::Unsigned(unsigned)
    } else if let Some(signed) = number.as_i64() {
        Numeric::Signed(signed)
    } else {
        Numeric::Float(number.as_f64().unwrap_or(f64::NAN))
    }
}

/// Numeric comparison as real numbers, independent of representation.
pub(crate) fn compare(left: &Number, right: &Number) -> Option<Ordering> {
    use Numeric::{Float, Signed, Unsigned};
    match (numeric(left), numeric(right)) {
        (Unsigned(a), Unsigned(b)) => Some(a.cmp(&b)),
        (Signed(a), Signed(b)) => Some(a.cmp(&b)),
        (Float(a), Float(b)) => a.partial_cmp(&b),
        (Unsigned(a), Signed(b)) => NumCmp::num_cmp(a, b),
        (Unsigned(a), Float(b)) => NumCmp::num_cmp(a, b),
        (Signed(a), Unsigned(b)) => NumCmp::num_cmp(a, b),
        (Signed(a), Float(b)) => NumCmp::num_cmp(a, b),
        (Float(a), Unsigned(b)) => NumCmp::num_cmp(a, b),
        (Float(a), Signed(b)) => NumCmp::num_cmp(a, b),
    }
}

/// Structural equality: arrays ordered, objects unordered, numbers compared
/// as real values (`1 == 1.0`).
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => compare(a, b) == Some(Ordering::Equal),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| equal(x, y)))
        }
        _ => left == right,
    }
}

/// String length in Unicode code points, not bytes or UTF-16 units.
pub(crate) fn unicode_length(value: &str) -> usize {
    bytecount::num_chars(value.as_bytes())
}

/// Read a keyword value as a non-negative integer, tolerating integer-valued
/// floats.
pub(crate) fn as_u64(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|float| *float >= 0.0 && float.trunc() == *float)
            .map(|float| float as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_compare_across_representations() {
        assert!(equal(&json!(1), &json!(1.0)));
        assert!(equal(&json!(-2), &json!(-2.0)));
        assert!(!equal(&json!(1), &json!(1.5)));
        assert!(is_integer(json!(1.0).as_number().expect("number")));
        assert!(!is_integer(json!(1.2).as_number().expect("number")));
    }

    #[test]
    fn object_equality_ignores_key_order() {
        let left = json!({"a": 1, "b": [1, {"c": 2}]});
        let right = json!({"b": [1, {"c": 2.0}], "a": 1.0});
        assert!(equal(&left, &right));
        assert!(!equal(&left, &json!({"a": 1})));
    }

    #[test]
    fn code_point_lengths() {
        assert_eq!(unicode_length("😀"), 1);
        assert_eq!(unicode_length("héllo"), 5);
    }
}
