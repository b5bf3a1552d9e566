//! `oneOf`: exactly one child must pass.
use serde_json::Value;

use crate::{
    context::EvaluationContext,
    error::{Composition, ValidationError},
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    validators::{BoxedValidator, Validate},
};

pub(crate) struct OneOfValidator {
    location: JsonPointer,
    children: Vec<BoxedValidator>,
}

impl OneOfValidator {
    pub(crate) fn new(location: JsonPointer, children: Vec<BoxedValidator>) -> Self {
        OneOfValidator { location, children }
    }
}

impl Validate for OneOfValidator {
    fn validate<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        let mut evaluation = None;
        let mut matched = 0usize;
        for child in &self.children {
            ctx.check_cancelled(instance, path)?;
            if let Ok(child_evaluation) = child.validate(ctx, instance, path) {
                matched += 1;
                if matched > 1 {
                    // Keep counting for the error message.
                    evaluation = None;
                    continue;
                }
                evaluation = Some(child_evaluation);
            }
        }
        match (matched, evaluation) {
            (1, Some(evaluation)) => Ok(evaluation),
            (matched, _) => Err(ValidationError::composition_failed(
                self.location.join("oneOf"),
                path.into(),
                instance,
                Composition::OneOf,
                matched,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(&json!("x"), true; "first branch")]
    #[test_case(&json!(7), true; "second branch")]
    #[test_case(&json!(null), false; "no branch")]
    #[test_case(&json!(7.5), false; "both branches")]
    fn exactly_one(instance: &serde_json::Value, expected: bool) {
        let schema = json!({"oneOf": [{"type": "string"}, {"minimum": 5}]});
        assert_eq!(crate::is_valid(&schema, instance), expected);
    }

    #[test]
    fn multiple_matches_report_the_count() {
        let schema = json!({"oneOf": [{"minimum": 0}, {"maximum": 10}]});
        tests_util::assert_error_kind(&schema, &json!(5), |kind| {
            matches!(
                kind,
                crate::ValidationErrorKind::CompositionFailed {
                    composition: crate::Composition::OneOf,
                    matched: 2
                }
            )
        });
    }

    #[test]
    fn only_the_single_match_contributes_annotations() {
        let schema = json!({
            "oneOf": [
                {"properties": {"a": true}, "required": ["a"]},
                {"properties": {"b": true}, "required": ["b"]}
            ],
            "unevaluatedProperties": false
        });
        tests_util::assert_valid(&schema, &json!({"a": 1}));
        tests_util::assert_not_valid(&schema, &json!({"a": 1, "c": 2}));
    }
}
