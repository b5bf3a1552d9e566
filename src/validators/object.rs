//! Object constraints: counts, `required`, `properties`,
//! `patternProperties`, `propertyNames`, `additionalProperties`.
//!
//! Per-key checks run in this order: `properties`, every matching
//! `patternProperties`, `propertyNames` (against the key string, never
//! marked), then `additionalProperties` for keys the first two did not
//! cover. `serde_json`'s map iterates keys in sorted order, so the first
//! failing property is stable across runs.
use ahash::AHashMap;
use serde_json::Value;

use crate::{
    context::EvaluationContext,
    error::ValidationError,
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    primitive_type::PrimitiveType,
    validators::{BoxedValidator, Validate},
};

pub(crate) struct ObjectValidator {
    location: JsonPointer,
    strict: bool,
    min_properties: Option<u64>,
    max_properties: Option<u64>,
    required: Vec<String>,
    properties: AHashMap<String, BoxedValidator>,
    pattern_properties: Vec<(String, fancy_regex::Regex, BoxedValidator)>,
    additional_properties: Option<BoxedValidator>,
    property_names: Option<BoxedValidator>,
}

pub(crate) struct ObjectParts {
    pub(crate) min_properties: Option<u64>,
    pub(crate) max_properties: Option<u64>,
    pub(crate) required: Vec<String>,
    pub(crate) properties: AHashMap<String, BoxedValidator>,
    pub(crate) pattern_properties: Vec<(String, fancy_regex::Regex, BoxedValidator)>,
    pub(crate) additional_properties: Option<BoxedValidator>,
    pub(crate) property_names: Option<BoxedValidator>,
}

impl ObjectValidator {
    pub(crate) fn new(location: JsonPointer, strict: bool, parts: ObjectParts) -> Self {
        ObjectValidator {
            location,
            strict,
            min_properties: parts.min_properties,
            max_properties: parts.max_properties,
            required: parts.required,
            properties: parts.properties,
            pattern_properties: parts.pattern_properties,
            additional_properties: parts.additional_properties,
            property_names: parts.property_names,
        }
    }
}

impl Validate for ObjectValidator {
    fn validate<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        match self.validate_folding(ctx, instance, path) {
            (evaluation, None) => Ok(evaluation),
            (_, Some(error)) => Err(error),
        }
    }

    fn validate_folding<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> (Evaluation, Option<ValidationError<'i>>) {
        let Value::Object(map) = instance else {
            if self.strict {
                return (
                    Evaluation::None,
                    Some(ValidationError::type_mismatch(
                        self.location.join("type"),
                        path.into(),
                        instance,
                        PrimitiveType::Object,
                    )),
                );
            }
            return (Evaluation::None, None);
        };
        let mut evaluation = Evaluation::None;
        if let Some(limit) = self.min_properties {
            if (map.len() as u64) < limit {
                return (
                    evaluation,
                    Some(ValidationError::out_of_range(
                        self.location.join("minProperties"),
                        path.into(),
                        instance,
                        "minProperties",
                        Value::from(limit),
                    )),
                );
            }
        }
        if let Some(limit) = self.max_properties {
            if (map.len() as u64) > limit {
                return (
                    evaluation,
                    Some(ValidationError::out_of_range(
                        self.location.join("maxProperties"),
                        path.into(),
                        instance,
                        "maxProperties",
                        Value::from(limit),
                    )),
                );
            }
        }
        for property in &self.required {
            if !map.contains_key(property) {
                return (
                    evaluation,
                    Some(ValidationError::missing_required(
                        self.location.join("required"),
                        path.into(),
                        instance,
                        property,
                    )),
                );
            }
        }
        let member_ctx = ctx.for_member();
        for (key, value) in map {
            if let Err(error) = ctx.check_cancelled(instance, path) {
                return (evaluation, Some(error));
            }
            let value_path = path.push(key.as_str());
            let mut covered = false;
            if let Some(validator) = self.properties.get(key) {
                if let Err(error) = validator.validate(&member_ctx, value, &value_path) {
                    return (evaluation, Some(error));
                }
                evaluation.mark_property(key);
                covered = true;
            }
            for (_, regex, validator) in &self.pattern_properties {
                if matches!(regex.is_match(key), Ok(true)) {
                    if let Err(error) = validator.validate(&member_ctx, value, &value_path) {
                        return (evaluation, Some(error));
                    }
                    evaluation.mark_property(key);
                    covered = true;
                }
            }
            if let Some(property_names) = &self.property_names {
                let name = Value::String(key.clone());
                if let Err(error) = property_names.validate(&member_ctx, &name, &value_path) {
                    return (evaluation, Some(error.into_owned()));
                }
            }
            if !covered {
                if let Some(additional) = &self.additional_properties {
                    if let Err(error) = additional.validate(&member_ctx, value, &value_path) {
                        if matches!(
                            error.kind,
                            crate::error::ValidationErrorKind::NotViolated
                        ) {
                            // A `false` schema here reads better as the
                            // dedicated additional-properties error.
                            return (
                                evaluation,
                                Some(ValidationError::additional_not_allowed(
                                    self.location.join("additionalProperties"),
                                    path.into(),
                                    instance,
                                    vec![key.clone()],
                                )),
                            );
                        }
                        return (evaluation, Some(error));
                    }
                    evaluation.mark_property(key);
                }
            }
        }
        (evaluation, None)
    }
}
