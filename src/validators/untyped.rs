//! `enum` and `const`, applied regardless of the declared types.
use serde_json::Value;

use crate::{
    context::EvaluationContext,
    error::ValidationError,
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    validators::{helpers, CompilationResult, Validate},
};

pub(crate) struct EnumValidator {
    location: JsonPointer,
    options: Vec<Value>,
}

impl EnumValidator {
    pub(crate) fn compile(location: JsonPointer, value: &Value) -> CompilationResult {
        let Value::Array(options) = value else {
            return Err(ValidationError::invalid_schema(
                location.join("enum"),
                "\"enum\" must be an array",
            ));
        };
        Ok(Box::new(EnumValidator {
            location,
            options: options.clone(),
        }))
    }
}

impl Validate for EnumValidator {
    fn validate<'i>(
        &self,
        _: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        if self
            .options
            .iter()
            .any(|option| helpers::equal(instance, option))
        {
            Ok(Evaluation::None)
        } else {
            Err(ValidationError::enum_mismatch(
                self.location.join("enum"),
                path.into(),
                instance,
                &self.options,
            ))
        }
    }
}

pub(crate) struct ConstValidator {
    location: JsonPointer,
    expected: Value,
}

impl ConstValidator {
    pub(crate) fn compile(location: JsonPointer, value: &Value) -> CompilationResult {
        Ok(Box::new(ConstValidator {
            location,
            expected: value.clone(),
        }))
    }
}

impl Validate for ConstValidator {
    fn validate<'i>(
        &self,
        _: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        if helpers::equal(instance, &self.expected) {
            Ok(Evaluation::None)
        } else {
            Err(ValidationError::const_mismatch(
                self.location.join("const"),
                path.into(),
                instance,
                &self.expected,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::json;

    #[test]
    fn enum_applies_across_types() {
        let schema = json!({"enum": [1, "two", [3], null]});
        tests_util::assert_valid(&schema, &json!(1));
        tests_util::assert_valid(&schema, &json!(1.0));
        tests_util::assert_valid(&schema, &json!("two"));
        tests_util::assert_valid(&schema, &json!([3]));
        tests_util::assert_valid(&schema, &json!(null));
        tests_util::assert_not_valid(&schema, &json!(2));
        tests_util::assert_not_valid(&schema, &json!("1"));
    }

    #[test]
    fn const_uses_deep_equality() {
        let schema = json!({"const": {"a": [1, 2]}});
        tests_util::assert_valid(&schema, &json!({"a": [1, 2]}));
        tests_util::assert_valid(&schema, &json!({"a": [1.0, 2.0]}));
        tests_util::assert_not_valid(&schema, &json!({"a": [1]}));
    }

    #[test]
    fn enum_must_be_an_array() {
        assert!(crate::validator_for(&json!({"enum": "oops"})).is_err());
    }
}
