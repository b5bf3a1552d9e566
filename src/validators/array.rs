//! Array constraints: bounds, uniqueness, `prefixItems`/`items`/
//! `additionalItems`, and `contains` with its counting rules.
//!
//! Every index asserted on is recorded in the returned evaluation so an
//! enclosing unevaluated coordinator can see it. Marks are produced in a
//! fixed order: prefix items, items/additional items, then contains.
use serde_json::Value;

use crate::{
    context::EvaluationContext,
    error::ValidationError,
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    primitive_type::PrimitiveType,
    validators::{helpers, BoxedValidator, Validate},
};

pub(crate) struct ArrayValidator {
    location: JsonPointer,
    strict: bool,
    min_items: Option<u64>,
    max_items: Option<u64>,
    unique_items: bool,
    prefix_items: Vec<BoxedValidator>,
    items: Option<BoxedValidator>,
    /// Applies beyond `prefixItems` only when `items` is absent.
    additional_items: Option<BoxedValidator>,
    contains: Option<ContainsConstraint>,
}

pub(crate) struct ContainsConstraint {
    pub(crate) node: BoxedValidator,
    pub(crate) min: u64,
    pub(crate) max: Option<u64>,
}

pub(crate) struct ArrayParts {
    pub(crate) min_items: Option<u64>,
    pub(crate) max_items: Option<u64>,
    pub(crate) unique_items: bool,
    pub(crate) prefix_items: Vec<BoxedValidator>,
    pub(crate) items: Option<BoxedValidator>,
    pub(crate) additional_items: Option<BoxedValidator>,
    pub(crate) contains: Option<ContainsConstraint>,
}

impl ArrayValidator {
    pub(crate) fn new(location: JsonPointer, strict: bool, parts: ArrayParts) -> Self {
        ArrayValidator {
            location,
            strict,
            min_items: parts.min_items,
            max_items: parts.max_items,
            unique_items: parts.unique_items,
            prefix_items: parts.prefix_items,
            items: parts.items,
            additional_items: parts.additional_items,
            contains: parts.contains,
        }
    }
}

impl Validate for ArrayValidator {
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
        let Value::Array(items) = instance else {
            if self.strict {
                return (
                    Evaluation::None,
                    Some(ValidationError::type_mismatch(
                        self.location.join("type"),
                        path.into(),
                        instance,
                        PrimitiveType::Array,
                    )),
                );
            }
            return (Evaluation::None, None);
        };
        let mut evaluation = Evaluation::None;
        if let Some(limit) = self.min_items {
            if (items.len() as u64) < limit {
                return (
                    evaluation,
                    Some(ValidationError::out_of_range(
                        self.location.join("minItems"),
                        path.into(),
                        instance,
                        "minItems",
                        Value::from(limit),
                    )),
                );
            }
        }
        if let Some(limit) = self.max_items {
            if (items.len() as u64) > limit {
                return (
                    evaluation,
                    Some(ValidationError::out_of_range(
                        self.location.join("maxItems"),
                        path.into(),
                        instance,
                        "maxItems",
                        Value::from(limit),
                    )),
                );
            }
        }
        if self.unique_items {
            for (second, item) in items.iter().enumerate() {
                for (first, earlier) in items[..second].iter().enumerate() {
                    if helpers::equal(earlier, item) {
                        return (
                            evaluation,
                            Some(ValidationError::uniqueness_violation(
                                self.location.join("uniqueItems"),
                                path.into(),
                                instance,
                                first,
                                second,
                            )),
                        );
                    }
                }
            }
        }
        let member_ctx = ctx.for_member();
        for (index, item) in items.iter().enumerate() {
            if let Err(error) = ctx.check_cancelled(instance, path) {
                return (evaluation, Some(error));
            }
            let item_path = path.push(index);
            if let Some(validator) = self.prefix_items.get(index) {
                if let Err(error) = validator.validate(&member_ctx, item, &item_path) {
                    return (evaluation, Some(error));
                }
                evaluation.mark_item(index);
            } else if let Some(items_validator) = &self.items {
                if let Err(error) = items_validator.validate(&member_ctx, item, &item_path) {
                    return (evaluation, Some(error));
                }
                evaluation.mark_item(index);
            } else if let Some(additional) = &self.additional_items {
                if let Err(error) = additional.validate(&member_ctx, item, &item_path) {
                    return (evaluation, Some(error));
                }
                evaluation.mark_item(index);
            }
        }
        if let Some(contains) = &self.contains {
            let mut matched = 0usize;
            for (index, item) in items.iter().enumerate() {
                let item_path = path.push(index);
                if contains
                    .node
                    .validate(&member_ctx, item, &item_path)
                    .is_ok()
                {
                    evaluation.mark_item(index);
                    matched += 1;
                }
            }
            if (matched as u64) < contains.min {
                return (
                    evaluation,
                    Some(ValidationError::contains_violation(
                        self.location.join("contains"),
                        path.into(),
                        instance,
                        matched,
                        contains.min,
                        contains.max,
                    )),
                );
            }
            if let Some(max) = contains.max {
                if matched as u64 > max {
                    return (
                        evaluation,
                        Some(ValidationError::contains_violation(
                            self.location.join("maxContains"),
                            path.into(),
                            instance,
                            matched,
                            contains.min,
                            contains.max,
                        )),
                    );
                }
            }
        }
        (evaluation, None)
    }
}
