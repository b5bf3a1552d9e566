//! `allOf` and the generic keyword pipeline.
//!
//! Children are cousins: each one sees the parent's context untouched, and
//! their annotations are merged only after every child has succeeded. The
//! compiler reuses this node to chain the keyword stages of a single schema,
//! which has the same contract.
use serde_json::Value;

use crate::{
    context::EvaluationContext,
    error::ValidationError,
    evaluation::Evaluation,
    paths::InstancePath,
    validators::{BoxedValidator, Validate},
};

pub(crate) struct AllOfValidator {
    children: Vec<BoxedValidator>,
}

impl AllOfValidator {
    pub(crate) fn new(children: Vec<BoxedValidator>) -> Self {
        AllOfValidator { children }
    }
}

impl Validate for AllOfValidator {
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
        let mut evaluation = Evaluation::None;
        for child in &self.children {
            if let Err(error) = ctx.check_cancelled(instance, path) {
                return (evaluation, Some(error));
            }
            match child.validate(ctx, instance, path) {
                Ok(child_evaluation) => evaluation.merge(child_evaluation),
                Err(error) => return (evaluation, Some(error)),
            }
        }
        (evaluation, None)
    }
}
