//! The compiled validator tree.
//!
//! Every node implements [`Validate`]: given the evaluation context and a
//! value, it either fails with the first violation it finds or succeeds with
//! the annotations it produced. Nodes are immutable after compilation; the
//! only late-bound pieces are the lazily compiled reference children, which
//! initialize under a one-shot guard.
pub(crate) mod all_of;
pub(crate) mod any_of;
pub(crate) mod array;
pub(crate) mod boolean;
pub(crate) mod content;
pub(crate) mod dependent;
pub(crate) mod format;
pub(crate) mod helpers;
pub(crate) mod if_;
pub(crate) mod not_;
pub(crate) mod null;
pub(crate) mod number;
pub(crate) mod object;
pub(crate) mod one_of;
pub(crate) mod reference;
pub(crate) mod string;
pub(crate) mod type_;
pub(crate) mod unevaluated;
pub(crate) mod untyped;

use serde_json::Value;

use crate::{
    context::EvaluationContext, error::ValidationError, evaluation::Evaluation,
    paths::InstancePath,
};

pub(crate) type BoxedValidator = Box<dyn Validate + Send + Sync>;
pub(crate) type CompilationResult = Result<BoxedValidator, ValidationError<'static>>;

/// A compiled validator node.
pub(crate) trait Validate: Send + Sync {
    /// Validate `instance`, returning the produced annotations or the first
    /// violation.
    fn validate<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>>;

    /// Like [`Validate::validate`], but also surfaces the annotations that
    /// were collected before a failure. Only `if` consumes the partial
    /// annotations of a failed subschema; nodes where partial marks can
    /// accumulate (objects, arrays, `allOf` pipelines) override this.
    fn validate_folding<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> (Evaluation, Option<ValidationError<'i>>) {
        match self.validate(ctx, instance, path) {
            Ok(evaluation) => (evaluation, None),
            Err(error) => (Evaluation::None, Some(error)),
        }
    }
}

impl Validate for BoxedValidator {
    fn validate<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        (**self).validate(ctx, instance, path)
    }

    fn validate_folding<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> (Evaluation, Option<ValidationError<'i>>) {
        (**self).validate_folding(ctx, instance, path)
    }
}
