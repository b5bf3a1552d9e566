//! The `type` keyword for lists of types.
//!
//! A single declared type folds into the corresponding leaf validator with
//! its strict flag set; lists get this membership check up front, with the
//! per-type constraints compiled as non-strict leaves behind it.
use serde_json::Value;

use crate::{
    context::EvaluationContext,
    error::ValidationError,
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    primitive_type::{PrimitiveType, PrimitiveTypesBitMap},
    validators::{CompilationResult, Validate},
};

pub(crate) struct MultipleTypesValidator {
    location: JsonPointer,
    types: PrimitiveTypesBitMap,
}

impl MultipleTypesValidator {
    pub(crate) fn compile(location: JsonPointer, items: &[Value]) -> CompilationResult {
        let mut types = PrimitiveTypesBitMap::new();
        for item in items {
            let name = item.as_str().ok_or_else(|| {
                ValidationError::invalid_schema(
                    location.join("type"),
                    "\"type\" entries must be strings",
                )
            })?;
            let primitive_type = PrimitiveType::try_from(name).map_err(|()| {
                ValidationError::invalid_schema(
                    location.join("type"),
                    format!("\"{name}\" is not a JSON type"),
                )
            })?;
            types |= primitive_type;
        }
        Ok(Box::new(MultipleTypesValidator { location, types }))
    }
}

impl Validate for MultipleTypesValidator {
    fn validate<'i>(
        &self,
        _: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        if self.types.matches(instance) {
            Ok(Evaluation::None)
        } else {
            Err(ValidationError::multiple_type_mismatch(
                self.location.join("type"),
                path.into(),
                instance,
                self.types,
            ))
        }
    }
}
