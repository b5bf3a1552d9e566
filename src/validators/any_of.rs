//! `anyOf`: at least one child must pass.
//!
//! Every child runs even after a success, because the annotations of all
//! passing children are visible to `unevaluatedProperties`.
use serde_json::Value;

use crate::{
    context::EvaluationContext,
    error::{Composition, ValidationError},
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    validators::{BoxedValidator, Validate},
};

pub(crate) struct AnyOfValidator {
    location: JsonPointer,
    children: Vec<BoxedValidator>,
}

impl AnyOfValidator {
    pub(crate) fn new(location: JsonPointer, children: Vec<BoxedValidator>) -> Self {
        AnyOfValidator { location, children }
    }
}

impl Validate for AnyOfValidator {
    fn validate<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        let mut evaluation = Evaluation::None;
        let mut matched = 0usize;
        for child in &self.children {
            ctx.check_cancelled(instance, path)?;
            if let Ok(child_evaluation) = child.validate(ctx, instance, path) {
                evaluation.merge(child_evaluation);
                matched += 1;
            }
        }
        if matched == 0 {
            return Err(ValidationError::composition_failed(
                self.location.join("anyOf"),
                path.into(),
                instance,
                Composition::AnyOf,
                0,
            ));
        }
        Ok(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::json;

    #[test]
    fn one_passing_child_suffices() {
        let schema = json!({"anyOf": [{"type": "string"}, {"minimum": 5}]});
        tests_util::assert_valid(&schema, &json!("x"));
        tests_util::assert_valid(&schema, &json!(9));
        tests_util::assert_not_valid(&schema, &json!(1));
    }

    #[test]
    fn all_passing_children_contribute_annotations() {
        let schema = json!({
            "anyOf": [
                {"properties": {"a": true}},
                {"properties": {"b": true}, "required": ["b"]}
            ],
            "unevaluatedProperties": false
        });
        // Both children pass, so both `a` and `b` are evaluated.
        tests_util::assert_valid(&schema, &json!({"a": 1, "b": 2}));
        // The second child fails; its annotations must not count.
        tests_util::assert_not_valid(&schema, &json!({"a": 1, "c": 2}));
    }

    #[test]
    fn failure_reports_the_composition() {
        let schema = json!({"anyOf": [{"type": "string"}, {"type": "null"}]});
        tests_util::assert_error_kind(&schema, &json!(1), |kind| {
            matches!(
                kind,
                crate::ValidationErrorKind::CompositionFailed {
                    composition: crate::Composition::AnyOf,
                    matched: 0
                }
            )
        });
    }
}
