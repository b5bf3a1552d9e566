//! Numeric constraints for `number` and `integer`.
use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use crate::{
    context::EvaluationContext,
    error::ValidationError,
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    primitive_type::PrimitiveType,
    validators::{helpers, CompilationResult, Validate},
};

pub(crate) struct NumericValidator {
    location: JsonPointer,
    strict: bool,
    /// `integer` semantics: floats must be exact integers in native range.
    integer: bool,
    minimum: Option<Number>,
    maximum: Option<Number>,
    exclusive_minimum: Option<Number>,
    exclusive_maximum: Option<Number>,
    multiple_of: Option<f64>,
}

impl NumericValidator {
    pub(crate) fn compile(
        location: JsonPointer,
        parent: &Map<String, Value>,
        strict: bool,
        integer: bool,
    ) -> CompilationResult {
        let multiple_of = match parent.get("multipleOf") {
            Some(Value::Number(number)) => {
                let value = number.as_f64().unwrap_or(0.0);
                if value <= 0.0 {
                    return Err(ValidationError::invalid_schema(
                        location.join("multipleOf"),
                        "\"multipleOf\" must be greater than zero",
                    ));
                }
                // Every integer is a multiple of a positive number below one.
                if integer && value < 1.0 {
                    None
                } else {
                    Some(value)
                }
            }
            Some(_) => {
                return Err(ValidationError::invalid_schema(
                    location.join("multipleOf"),
                    "\"multipleOf\" must be a number",
                ))
            }
            None => None,
        };
        Ok(Box::new(NumericValidator {
            minimum: bound(parent, &location, "minimum")?,
            maximum: bound(parent, &location, "maximum")?,
            exclusive_minimum: bound(parent, &location, "exclusiveMinimum")?,
            exclusive_maximum: bound(parent, &location, "exclusiveMaximum")?,
            location,
            strict,
            integer,
            multiple_of,
        }))
    }

    fn expected_type(&self) -> PrimitiveType {
        if self.integer {
            PrimitiveType::Integer
        } else {
            PrimitiveType::Number
        }
    }
}

fn bound(
    parent: &Map<String, Value>,
    location: &JsonPointer,
    keyword: &'static str,
) -> Result<Option<Number>, ValidationError<'static>> {
    match parent.get(keyword) {
        Some(Value::Number(number)) => Ok(Some(number.clone())),
        Some(_) => Err(ValidationError::invalid_schema(
            location.join(keyword),
            format!("\"{keyword}\" must be a number"),
        )),
        None => Ok(None),
    }
}

impl Validate for NumericValidator {
    fn validate<'i>(
        &self,
        _: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        let Value::Number(number) = instance else {
            if self.strict {
                return Err(ValidationError::type_mismatch(
                    self.location.join("type"),
                    path.into(),
                    instance,
                    self.expected_type(),
                ));
            }
            return Ok(Evaluation::None);
        };
        if self.integer && !helpers::is_integer(number) {
            if self.strict {
                return Err(ValidationError::type_mismatch(
                    self.location.join("type"),
                    path.into(),
                    instance,
                    PrimitiveType::Integer,
                ));
            }
            return Ok(Evaluation::None);
        }
        // NaN cannot come from JSON text; reject it if a caller built one.
        if number.as_f64().is_some_and(f64::is_nan) {
            return Err(ValidationError::type_mismatch(
                self.location.join("type"),
                path.into(),
                instance,
                self.expected_type(),
            ));
        }
        if let Some(limit) = &self.minimum {
            if !matches!(
                helpers::compare_numbers(number, limit),
                Some(Ordering::Greater | Ordering::Equal)
            ) {
                return Err(self.range_error(path, instance, "minimum", limit));
            }
        }
        if let Some(limit) = &self.maximum {
            if !matches!(
                helpers::compare_numbers(number, limit),
                Some(Ordering::Less | Ordering::Equal)
            ) {
                return Err(self.range_error(path, instance, "maximum", limit));
            }
        }
        if let Some(limit) = &self.exclusive_minimum {
            if !matches!(
                helpers::compare_numbers(number, limit),
                Some(Ordering::Greater)
            ) {
                return Err(self.range_error(path, instance, "exclusiveMinimum", limit));
            }
        }
        if let Some(limit) = &self.exclusive_maximum {
            if !matches!(helpers::compare_numbers(number, limit), Some(Ordering::Less)) {
                return Err(self.range_error(path, instance, "exclusiveMaximum", limit));
            }
        }
        if let Some(multiple_of) = self.multiple_of {
            let value = number.as_f64().unwrap_or(f64::NAN);
            if !is_multiple_of(value, multiple_of) {
                return Err(ValidationError::out_of_range(
                    self.location.join("multipleOf"),
                    path.into(),
                    instance,
                    "multipleOf",
                    Value::from(multiple_of),
                ));
            }
        }
        Ok(Evaluation::None)
    }
}

impl NumericValidator {
    fn range_error<'i>(
        &self,
        path: &InstancePath<'_>,
        instance: &'i Value,
        keyword: &'static str,
        limit: &Number,
    ) -> ValidationError<'i> {
        ValidationError::out_of_range(
            self.location.join(keyword),
            path.into(),
            instance,
            keyword,
            Value::Number(limit.clone()),
        )
    }
}

/// Floating-point multiple check with a 1e-9 tolerance on the remainder.
fn is_multiple_of(value: f64, multiple_of: f64) -> bool {
    if !value.is_finite() {
        return false;
    }
    let remainder = (value % multiple_of).abs();
    remainder <= 1e-9 || (multiple_of - remainder).abs() <= 1e-9
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(&json!({"type": "integer"}), &json!(3), true)]
    #[test_case(&json!({"type": "integer"}), &json!(3.0), true; "integral float")]
    #[test_case(&json!({"type": "integer"}), &json!(3.5), false)]
    #[test_case(&json!({"type": "integer"}), &json!(1e300), false; "out of native range")]
    #[test_case(&json!({"type": "number"}), &json!(3.5), true)]
    #[test_case(&json!({"type": "number"}), &json!("3"), false)]
    fn type_checks(schema: &serde_json::Value, instance: &serde_json::Value, expected: bool) {
        assert_eq!(crate::is_valid(schema, instance), expected);
    }

    #[test_case(&json!(5), true)]
    #[test_case(&json!(10), true; "at maximum")]
    #[test_case(&json!(2), true; "at minimum")]
    #[test_case(&json!(1), false; "below minimum")]
    #[test_case(&json!(11), false; "above maximum")]
    fn inclusive_bounds(instance: &serde_json::Value, expected: bool) {
        let schema = json!({"minimum": 2, "maximum": 10});
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test_case(&json!(3), true)]
    #[test_case(&json!(2), false; "at exclusive minimum")]
    #[test_case(&json!(10), false; "at exclusive maximum")]
    fn exclusive_bounds(instance: &serde_json::Value, expected: bool) {
        let schema = json!({"exclusiveMinimum": 2, "exclusiveMaximum": 10});
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test_case(&json!(9), true)]
    #[test_case(&json!(9.3), false)]
    #[test_case(&json!(0.06), true; "float multiple")]
    fn multiples(instance: &serde_json::Value, expected: bool) {
        let schema = json!({"multipleOf": 0.01});
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test]
    fn sub_one_multiple_of_is_skipped_for_integers() {
        let schema = json!({"type": "integer", "multipleOf": 0.5});
        tests_util::assert_valid(&schema, &json!(7));
    }

    #[test]
    fn non_positive_multiple_of_fails_compilation() {
        assert!(crate::validator_for(&json!({"multipleOf": 0})).is_err());
        assert!(crate::validator_for(&json!({"multipleOf": -2})).is_err());
    }

    #[test]
    fn constraints_ignore_other_types_without_declared_type() {
        tests_util::assert_valid(&json!({"minimum": 5}), &json!("abc"));
    }

    #[test]
    fn large_integers_compare_without_precision_loss() {
        let schema = json!({"minimum": u64::MAX});
        tests_util::assert_valid(&schema, &json!(u64::MAX));
        tests_util::assert_not_valid(&schema, &json!(u64::MAX - 1));
    }
}
