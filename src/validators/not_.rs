//! `not`: succeeds when the child fails. Produces no annotations.
use serde_json::Value;

use crate::{
    context::EvaluationContext,
    error::ValidationError,
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    validators::{BoxedValidator, Validate},
};

pub(crate) struct NotValidator {
    location: JsonPointer,
    child: BoxedValidator,
}

impl NotValidator {
    pub(crate) fn new(location: JsonPointer, child: BoxedValidator) -> Self {
        NotValidator { location, child }
    }
}

impl Validate for NotValidator {
    fn validate<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        match self.child.validate(ctx, instance, path) {
            Ok(_) => Err(ValidationError::not_violated(
                self.location.join("not"),
                path.into(),
                instance,
            )),
            Err(_) => Ok(Evaluation::None),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::json;

    #[test]
    fn inverts_the_child() {
        let schema = json!({"not": {"type": "string"}});
        tests_util::assert_valid(&schema, &json!(1));
        tests_util::assert_not_valid(&schema, &json!("x"));
    }

    #[test]
    fn produces_no_annotations() {
        let schema = json!({
            "not": {"properties": {"a": {"type": "integer"}}, "required": ["b"]},
            "unevaluatedProperties": false
        });
        // `not` passes (its child requires "b"), but evaluates nothing, so
        // any property trips the coordinator.
        tests_util::assert_not_valid(&schema, &json!({"a": 1}));
    }
}
