//! Shared helpers: JSON Schema equality, cross-width numeric comparisons,
//! and keyword extraction.
use std::cmp::Ordering;

use num_cmp::NumCmp;
use serde_json::{Map, Number, Value};

use crate::{error::ValidationError, paths::JsonPointer};

/// Read a non-negative integer bound from a schema object. Negative,
/// fractional, and non-numeric values are compile-time errors.
pub(crate) fn map_get_u64(
    map: &Map<String, Value>,
    location: &JsonPointer,
    keyword: &'static str,
) -> Result<Option<u64>, ValidationError<'static>> {
    match map.get(keyword) {
        Some(Value::Number(number)) => match number.as_u64() {
            Some(value) => Ok(Some(value)),
            None => Err(ValidationError::invalid_schema(
                location.join(keyword),
                format!("\"{keyword}\" must be a non-negative integer"),
            )),
        },
        Some(_) => Err(ValidationError::invalid_schema(
            location.join(keyword),
            format!("\"{keyword}\" must be a non-negative integer"),
        )),
        None => Ok(None),
    }
}

/// Deep equality with JSON Schema number semantics: `1`, `1.0`, and
/// `1e0` are the same value regardless of how `serde_json` stores them.
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::Number(left), Value::Number(right)) => equal_numbers(left, right),
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Array(left), Value::Array(right)) => equal_arrays(left, right),
        (Value::Object(left), Value::Object(right)) => equal_objects(left, right),
        (_, _) => false,
    }
}

fn equal_arrays(left: &[Value], right: &[Value]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right.iter())
            .all(|(left, right)| equal(left, right))
}

fn equal_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left.iter().all(|(key, left_value)| {
            right
                .get(key)
                .is_some_and(|right_value| equal(left_value, right_value))
        })
}

pub(crate) fn equal_numbers(left: &Number, right: &Number) -> bool {
    compare_numbers(left, right) == Some(Ordering::Equal)
}

/// Compare two JSON numbers without precision loss. `None` only for NaN.
pub(crate) fn compare_numbers(left: &Number, right: &Number) -> Option<Ordering> {
    if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
        return Some(left.cmp(&right));
    }
    if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        return Some(left.cmp(&right));
    }
    match (widen(left), widen(right)) {
        (Widened::Int(left), Widened::Int(right)) => Some(left.cmp(&right)),
        (Widened::Uint(left), Widened::Uint(right)) => Some(left.cmp(&right)),
        (Widened::Int(left), Widened::Uint(right)) => NumCmp::num_cmp(left, right),
        (Widened::Uint(left), Widened::Int(right)) => NumCmp::num_cmp(left, right),
        (Widened::Int(left), Widened::Float(right)) => NumCmp::num_cmp(left, right),
        (Widened::Uint(left), Widened::Float(right)) => NumCmp::num_cmp(left, right),
        (Widened::Float(left), Widened::Int(right)) => NumCmp::num_cmp(left, right),
        (Widened::Float(left), Widened::Uint(right)) => NumCmp::num_cmp(left, right),
        (Widened::Float(left), Widened::Float(right)) => NumCmp::num_cmp(left, right),
    }
}

enum Widened {
    Int(i64),
    Uint(u64),
    Float(f64),
}

fn widen(number: &Number) -> Widened {
    if let Some(value) = number.as_u64() {
        Widened::Uint(value)
    } else if let Some(value) = number.as_i64() {
        Widened::Int(value)
    } else {
        Widened::Float(number.as_f64().unwrap_or(f64::NAN))
    }
}

/// Whether a JSON number is an integer: either stored as one, or a float
/// that is finite, integral, and within the native integer range.
pub(crate) fn is_integer(number: &Number) -> bool {
    if number.is_i64() || number.is_u64() {
        return true;
    }
    number.as_f64().is_some_and(|value| {
        value.is_finite()
            && value.fract() == 0.0
            && value >= i64::MIN as f64
            && value <= u64::MAX as f64
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(&json!(1), &json!(1.0), true; "int equals float")]
    #[test_case(&json!(1), &json!(1), true; "int equals int")]
    #[test_case(&json!(1.5), &json!(1.5), true; "float equals float")]
    #[test_case(&json!(1), &json!(2), false; "different ints")]
    #[test_case(&json!(0), &json!(false), false; "zero is not false")]
    #[test_case(&json!(""), &json!(null), false; "empty string is not null")]
    #[test_case(&json!([1, [2.0]]), &json!([1.0, [2]]), true; "nested arrays")]
    #[test_case(&json!({"a": 1}), &json!({"a": 1.0}), true; "object values")]
    #[test_case(&json!({"a": 1}), &json!({"a": 1, "b": 2}), false; "extra key")]
    fn equality(left: &Value, right: &Value, expected: bool) {
        assert_eq!(equal(left, right), expected);
        assert_eq!(equal(right, left), expected);
    }

    #[test]
    fn comparison_spans_integer_widths() {
        let big = Number::from(u64::MAX);
        let small = Number::from(-1i64);
        assert_eq!(compare_numbers(&small, &big), Some(Ordering::Less));
        assert_eq!(compare_numbers(&big, &small), Some(Ordering::Greater));
    }

    #[test_case(&json!(5), true; "plain integer")]
    #[test_case(&json!(5.0), true; "integral float")]
    #[test_case(&json!(5.5), false; "fractional float")]
    #[test_case(&json!(1e19), true; "large integral float in range")]
    #[test_case(&json!(1e300), false; "out of native range")]
    fn integer_detection(value: &Value, expected: bool) {
        let Value::Number(number) = value else {
            unreachable!()
        };
        assert_eq!(is_integer(number), expected);
    }
}
