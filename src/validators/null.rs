//! The `null` type check.
use serde_json::Value;

use crate::{
    context::EvaluationContext,
    error::ValidationError,
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    primitive_type::PrimitiveType,
    validators::{CompilationResult, Validate},
};

pub(crate) struct NullValidator {
    location: JsonPointer,
}

impl NullValidator {
    pub(crate) fn compile(location: JsonPointer) -> CompilationResult {
        Ok(Box::new(NullValidator { location }))
    }
}

impl Validate for NullValidator {
    fn validate<'i>(
        &self,
        _: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        if instance.is_null() {
            Ok(Evaluation::None)
        } else {
            Err(ValidationError::type_mismatch(
                self.location.join("type"),
                path.into(),
                instance,
                PrimitiveType::Null,
            ))
        }
    }
}
