//! `dependentSchemas` and `dependentRequired`: constraints triggered by the
//! presence of a property.
use serde_json::Value;

use crate::{
    context::EvaluationContext,
    error::ValidationError,
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    validators::{BoxedValidator, Validate},
};

/// For every trigger property present in the object, the associated schema
/// applies to the whole object; its annotations count toward the result.
pub(crate) struct DependentSchemasValidator {
    dependents: Vec<(String, BoxedValidator)>,
}

impl DependentSchemasValidator {
    pub(crate) fn new(dependents: Vec<(String, BoxedValidator)>) -> Self {
        DependentSchemasValidator { dependents }
    }
}

impl Validate for DependentSchemasValidator {
    fn validate<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        let Value::Object(map) = instance else {
            return Ok(Evaluation::None);
        };
        let mut evaluation = Evaluation::None;
        for (trigger, validator) in &self.dependents {
            if map.contains_key(trigger) {
                ctx.check_cancelled(instance, path)?;
                evaluation.merge(validator.validate(ctx, instance, path)?);
            }
        }
        Ok(evaluation)
    }
}

pub(crate) struct DependentRequiredValidator {
    location: JsonPointer,
    dependents: Vec<(String, Vec<String>)>,
}

impl DependentRequiredValidator {
    pub(crate) fn new(location: JsonPointer, dependents: Vec<(String, Vec<String>)>) -> Self {
        DependentRequiredValidator {
            location,
            dependents,
        }
    }
}

impl Validate for DependentRequiredValidator {
    fn validate<'i>(
        &self,
        _: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        let Value::Object(map) = instance else {
            return Ok(Evaluation::None);
        };
        for (trigger, required) in &self.dependents {
            if map.contains_key(trigger) {
                for property in required {
                    if !map.contains_key(property) {
                        return Err(ValidationError::missing_required(
                            self.location.join("dependentRequired"),
                            path.into(),
                            instance,
                            property,
                        ));
                    }
                }
            }
        }
        Ok(Evaluation::None)
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(&json!({"foo": 1}), false; "trigger forbids itself")]
    #[test_case(&json!({"bar": 1}), true; "no trigger")]
    #[test_case(&json!({"foo": 1, "bar": 1}), false; "trigger present")]
    #[test_case(&json!(17), true; "non objects pass")]
    fn dependent_schemas(instance: &serde_json::Value, expected: bool) {
        let schema = json!({
            "dependentSchemas": {
                "foo": {"properties": {"bar": {}}, "additionalProperties": false}
            }
        });
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test]
    fn dependent_required_needs_companions() {
        let schema = json!({"dependentRequired": {"card": ["cvv", "expiry"]}});
        tests_util::assert_valid(&schema, &json!({"card": "4111", "cvv": "123", "expiry": "01/30"}));
        tests_util::assert_valid(&schema, &json!({"other": 1}));
        tests_util::assert_error_kind(&schema, &json!({"card": "4111", "cvv": "123"}), |kind| {
            matches!(
                kind,
                crate::ValidationErrorKind::MissingRequired { property } if property == "expiry"
            )
        });
    }

    #[test]
    fn dependent_schema_annotations_count_as_evaluated() {
        let schema = json!({
            "dependentSchemas": {"foo": {"properties": {"foo": true, "extra": true}}},
            "unevaluatedProperties": false
        });
        tests_util::assert_valid(&schema, &json!({"foo": 1, "extra": 2}));
        tests_util::assert_not_valid(&schema, &json!({"foo": 1, "other": 2}));
    }
}
