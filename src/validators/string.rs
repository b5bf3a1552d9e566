//! String constraints: `minLength`, `maxLength`, `pattern`, `format`.
use serde_json::{Map, Value};

use crate::{
    context::EvaluationContext,
    ecma,
    error::ValidationError,
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    primitive_type::PrimitiveType,
    validators::{format::CompiledFormat, helpers, CompilationResult, Validate},
};

pub(crate) struct StringValidator {
    location: JsonPointer,
    strict: bool,
    min_length: Option<u64>,
    max_length: Option<u64>,
    pattern: Option<(String, fancy_regex::Regex)>,
    format: Option<CompiledFormat>,
}

impl StringValidator {
    pub(crate) fn compile(
        location: JsonPointer,
        parent: &Map<String, Value>,
        strict: bool,
        format: Option<CompiledFormat>,
    ) -> CompilationResult {
        let min_length = helpers::map_get_u64(parent, &location, "minLength")?;
        let max_length = helpers::map_get_u64(parent, &location, "maxLength")?;
        let pattern = match parent.get("pattern") {
            Some(Value::String(pattern)) => Some((
                pattern.clone(),
                compile_regex(location.join("pattern"), pattern)?,
            )),
            Some(_) => {
                return Err(ValidationError::invalid_schema(
                    location.join("pattern"),
                    "\"pattern\" must be a string",
                ))
            }
            None => None,
        };
        Ok(Box::new(StringValidator {
            location,
            strict,
            min_length,
            max_length,
            pattern,
            format,
        }))
    }
}

pub(crate) fn compile_regex(
    location: JsonPointer,
    pattern: &str,
) -> Result<fancy_regex::Regex, ValidationError<'static>> {
    let translated = ecma::to_rust_regex(pattern)
        .map_err(|()| ValidationError::invalid_regex(location.clone(), pattern))?;
    fancy_regex::Regex::new(&translated)
        .map_err(|_| ValidationError::invalid_regex(location, pattern))
}

impl Validate for StringValidator {
    fn validate<'i>(
        &self,
        _: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        let Value::String(item) = instance else {
            if self.strict {
                return Err(ValidationError::type_mismatch(
                    self.location.join("type"),
                    path.into(),
                    instance,
                    PrimitiveType::String,
                ));
            }
            return Ok(Evaluation::None);
        };
        if self.min_length.is_some() || self.max_length.is_some() {
            // Lengths count Unicode code points, not bytes.
            let length = bytecount::num_chars(item.as_bytes()) as u64;
            if let Some(limit) = self.min_length {
                if length < limit {
                    return Err(ValidationError::out_of_range(
                        self.location.join("minLength"),
                        path.into(),
                        instance,
                        "minLength",
                        Value::from(limit),
                    ));
                }
            }
            if let Some(limit) = self.max_length {
                if length > limit {
                    return Err(ValidationError::out_of_range(
                        self.location.join("maxLength"),
                        path.into(),
                        instance,
                        "maxLength",
                        Value::from(limit),
                    ));
                }
            }
        }
        if let Some((pattern, regex)) = &self.pattern {
            if !matches!(regex.is_match(item), Ok(true)) {
                return Err(ValidationError::pattern_mismatch(
                    self.location.join("pattern"),
                    path.into(),
                    instance,
                    pattern,
                ));
            }
        }
        if let Some(format) = &self.format {
            if !format.is_valid(item) {
                return Err(ValidationError::format_mismatch(
                    self.location.join("format"),
                    path.into(),
                    instance,
                    format.name(),
                ));
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

    #[test_case(&json!("abc"), true; "within bounds")]
    #[test_case(&json!("abcd"), true; "at max")]
    #[test_case(&json!("abcde"), false; "too long")]
    #[test_case(&json!("a"), false; "too short")]
    #[test_case(&json!("bcd"), false; "pattern mismatch")]
    fn bounds_and_pattern(instance: &serde_json::Value, expected: bool) {
        let schema = json!({"type": "string", "minLength": 2, "maxLength": 4, "pattern": "^a"});
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test]
    fn non_string_fails_only_with_declared_type() {
        tests_util::assert_not_valid(&json!({"type": "string"}), &json!(123));
        tests_util::assert_valid(&json!({"minLength": 2}), &json!(123));
    }

    #[test]
    fn length_counts_code_points() {
        let schema = json!({"maxLength": 3});
        tests_util::assert_valid(&schema, &json!("日本語"));
        tests_util::assert_not_valid(&schema, &json!("日本語!"));
    }

    #[test]
    fn invalid_pattern_fails_compilation() {
        assert!(crate::validator_for(&json!({"pattern": "["})).is_err());
    }

    #[test]
    fn negative_min_length_fails_compilation() {
        assert!(crate::validator_for(&json!({"minLength": -1})).is_err());
    }

    #[test]
    fn ecma_class_shorthand_is_translated() {
        let schema = json!({"pattern": r"^\d+$"});
        tests_util::assert_valid(&schema, &json!("123"));
        tests_util::assert_not_valid(&schema, &json!("x1"));
    }
}
