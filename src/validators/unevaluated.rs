//! The coordinator behind `unevaluatedProperties` and `unevaluatedItems`.
//!
//! The coordinator owns every other keyword stage of the schema that
//! declared the `unevaluated*` keyword. Stages run in order and each one
//! sees the annotations accumulated by the stages before it (they are one
//! pipeline, not cousins). Afterwards the residual members, the ones no
//! stage evaluated, are checked against the `unevaluated*` behavior.
use serde_json::Value;

use crate::{
    context::EvaluationContext,
    error::{UnexpectedMembers, ValidationError},
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    validators::{BoxedValidator, Validate},
};

/// What to do with a residual member, as a sum type: `unevaluatedProperties`
/// and `unevaluatedItems` accept either a boolean or a schema.
pub(crate) enum UnevaluatedBehavior {
    /// `false`: any residual member is an error.
    Forbid,
    /// `true`: residual members are accepted and become evaluated.
    AllowAll,
    /// A schema every residual member must satisfy.
    Schema(BoxedValidator),
}

pub(crate) struct UnevaluatedCoordinator {
    location: JsonPointer,
    stages: Vec<BoxedValidator>,
    properties: Option<UnevaluatedBehavior>,
    items: Option<UnevaluatedBehavior>,
}

impl UnevaluatedCoordinator {
    pub(crate) fn new(
        location: JsonPointer,
        stages: Vec<BoxedValidator>,
        properties: Option<UnevaluatedBehavior>,
        items: Option<UnevaluatedBehavior>,
    ) -> Self {
        UnevaluatedCoordinator {
            location,
            stages,
            properties,
            items,
        }
    }

    fn apply_to_properties<'i>(
        &self,
        behavior: &UnevaluatedBehavior,
        ctx: &EvaluationContext,
        evaluation: &mut Evaluation,
        instance: &'i Value,
        map: &'i serde_json::Map<String, Value>,
        path: &InstancePath<'_>,
    ) -> Result<(), ValidationError<'i>> {
        match behavior {
            UnevaluatedBehavior::Forbid => {
                let unexpected: Vec<String> = map
                    .keys()
                    .filter(|key| !evaluation.is_property_evaluated(key))
                    .cloned()
                    .collect();
                if unexpected.is_empty() {
                    Ok(())
                } else {
                    Err(ValidationError::unevaluated_not_allowed(
                        self.location.join("unevaluatedProperties"),
                        path.into(),
                        instance,
                        UnexpectedMembers::Properties(unexpected),
                    ))
                }
            }
            UnevaluatedBehavior::AllowAll => {
                for key in map.keys() {
                    evaluation.mark_property(key);
                }
                Ok(())
            }
            UnevaluatedBehavior::Schema(validator) => {
                let member_ctx = ctx.for_member();
                for (key, value) in map {
                    if evaluation.is_property_evaluated(key) {
                        continue;
                    }
                    let value_path = path.push(key.as_str());
                    validator.validate(&member_ctx, value, &value_path)?;
                    evaluation.mark_property(key);
                }
                Ok(())
            }
        }
    }

    fn apply_to_items<'i>(
        &self,
        behavior: &UnevaluatedBehavior,
        ctx: &EvaluationContext,
        evaluation: &mut Evaluation,
        instance: &'i Value,
        items: &'i [Value],
        path: &InstancePath<'_>,
    ) -> Result<(), ValidationError<'i>> {
        match behavior {
            UnevaluatedBehavior::Forbid => {
                let unexpected: Vec<usize> = (0..items.len())
                    .filter(|index| !evaluation.is_item_evaluated(*index))
                    .collect();
                if unexpected.is_empty() {
                    Ok(())
                } else {
                    Err(ValidationError::unevaluated_not_allowed(
                        self.location.join("unevaluatedItems"),
                        path.into(),
                        instance,
                        UnexpectedMembers::Items(unexpected),
                    ))
                }
            }
            UnevaluatedBehavior::AllowAll => {
                for index in 0..items.len() {
                    evaluation.mark_item(index);
                }
                Ok(())
            }
            UnevaluatedBehavior::Schema(validator) => {
                let member_ctx = ctx.for_member();
                for (index, item) in items.iter().enumerate() {
                    if evaluation.is_item_evaluated(index) {
                        continue;
                    }
                    let item_path = path.push(index);
                    validator.validate(&member_ctx, item, &item_path)?;
                    evaluation.mark_item(index);
                }
                Ok(())
            }
        }
    }
}

impl Validate for UnevaluatedCoordinator {
    fn validate<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        // Annotations injected by an enclosing pipeline seed the residual
        // computation.
        let mut evaluation = ctx.seed.clone();
        for stage in &self.stages {
            ctx.check_cancelled(instance, path)?;
            let stage_ctx = ctx.with_seed(evaluation.clone());
            evaluation.merge(stage.validate(&stage_ctx, instance, path)?);
        }
        match instance {
            Value::Object(map) => {
                if let Some(behavior) = &self.properties {
                    self.apply_to_properties(behavior, ctx, &mut evaluation, instance, map, path)?;
                }
            }
            Value::Array(items) => {
                if let Some(behavior) = &self.items {
                    self.apply_to_items(behavior, ctx, &mut evaluation, instance, items, path)?;
                }
            }
            _ => {}
        }
        Ok(evaluation)
    }
}
