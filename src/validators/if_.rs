//! `if`/`then`/`else`.
//!
//! The `if` schema contributes annotations to the result even when it fails,
//! because whatever members it managed to assert on before failing were
//! still evaluated from the point of view of `unevaluated*`. That is what
//! `validate_folding` exists for.
use serde_json::Value;

use crate::{
    context::EvaluationContext,
    error::ValidationError,
    evaluation::Evaluation,
    paths::InstancePath,
    validators::{BoxedValidator, Validate},
};

pub(crate) struct IfThenElseValidator {
    condition: BoxedValidator,
    then_branch: Option<BoxedValidator>,
    else_branch: Option<BoxedValidator>,
}

impl IfThenElseValidator {
    pub(crate) fn new(
        condition: BoxedValidator,
        then_branch: Option<BoxedValidator>,
        else_branch: Option<BoxedValidator>,
    ) -> Self {
        IfThenElseValidator {
            condition,
            then_branch,
            else_branch,
        }
    }
}

impl Validate for IfThenElseValidator {
    fn validate<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        let (mut evaluation, condition_error) =
            self.condition.validate_folding(ctx, instance, path);
        let branch = if condition_error.is_none() {
            &self.then_branch
        } else {
            &self.else_branch
        };
        if let Some(branch) = branch {
            evaluation.merge(branch.validate(ctx, instance, path)?);
        }
        Ok(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::json;
    use test_case::test_case;

    fn conditional_schema() -> serde_json::Value {
        json!({
            "if": {"properties": {"type": {"const": "string"}}},
            "then": {"properties": {"value": {"type": "string", "minLength": 1}}},
            "else": {"properties": {"value": {"type": "number", "minimum": 0}}}
        })
    }

    #[test_case(&json!({"type": "string", "value": "hi"}), true)]
    #[test_case(&json!({"type": "string", "value": ""}), false)]
    #[test_case(&json!({"type": "number", "value": -1}), false)]
    #[test_case(&json!({"type": "number", "value": 3}), true)]
    fn branches(instance: &serde_json::Value, expected: bool) {
        assert_eq!(crate::is_valid(&conditional_schema(), instance), expected);
    }

    #[test]
    fn then_without_if_is_inert() {
        let schema = json!({"then": {"type": "string"}});
        tests_util::assert_valid(&schema, &json!(1));
    }

    #[test]
    fn if_annotations_always_count() {
        let schema = json!({
            "if": {"properties": {"a": {"type": "integer"}}},
            "unevaluatedProperties": false
        });
        // `if` passes and evaluates "a".
        tests_util::assert_valid(&schema, &json!({"a": 1}));
        // `if` fails on "b" after evaluating "a"; that partial mark still
        // counts, so `else` only needs to cover "b".
        let folding = json!({
            "if": {
                "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}}
            },
            "else": {"properties": {"b": true}},
            "unevaluatedProperties": false
        });
        tests_util::assert_valid(&folding, &json!({"a": 1, "b": "x"}));
        tests_util::assert_valid(&folding, &json!({"a": 1, "b": 2}));
    }

    #[test]
    fn missing_else_accepts_failed_condition() {
        let schema = json!({
            "if": {"type": "string"},
            "then": {"minLength": 2}
        });
        tests_util::assert_valid(&schema, &json!(1));
        tests_util::assert_not_valid(&schema, &json!("x"));
        tests_util::assert_valid(&schema, &json!("xy"));
    }
}
