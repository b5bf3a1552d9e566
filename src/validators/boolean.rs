//! The `true` schema and the `boolean` type check.
use serde_json::Value;

use crate::{
    context::EvaluationContext,
    error::ValidationError,
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    primitive_type::PrimitiveType,
    validators::{CompilationResult, Validate},
};

/// Accepts every value. `true` schemas and empty schema objects compile to
/// this node; `false` compiles to its negation.
pub(crate) struct EmptyValidator;

impl EmptyValidator {
    pub(crate) fn compile() -> CompilationResult {
        Ok(Box::new(EmptyValidator))
    }
}

impl Validate for EmptyValidator {
    fn validate<'i>(
        &self,
        _: &EvaluationContext,
        _: &'i Value,
        _: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        Ok(Evaluation::None)
    }
}

pub(crate) struct BooleanValidator {
    location: JsonPointer,
}

impl BooleanValidator {
    pub(crate) fn compile(location: JsonPointer) -> CompilationResult {
        Ok(Box::new(BooleanValidator { location }))
    }
}

impl Validate for BooleanValidator {
    fn validate<'i>(
        &self,
        _: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        if instance.is_boolean() {
            Ok(Evaluation::None)
        } else {
            Err(ValidationError::type_mismatch(
                self.location.join("type"),
                path.into(),
                instance,
                PrimitiveType::Boolean,
            ))
        }
    }
}
