//! Per-validation evaluation context.
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde_json::Value;

use crate::{
    error::ValidationError,
    evaluation::Evaluation,
    options::ValidationOptions,
    paths::InstancePath,
    resolver::ResolverPool,
    vocabulary::VocabularySet,
};

/// One entry of the dynamic scope: a schema resource together with the base
/// URI it establishes. The scope is ordered outermost first.
#[derive(Clone, Debug)]
pub(crate) struct ScopeEntry {
    pub(crate) schema: Arc<Value>,
    pub(crate) base_uri: String,
}

/// State threaded through a single `validate` call.
///
/// The context is an immutable snapshot: descending into a child validator
/// derives a new context instead of mutating the parent's, which is what
/// keeps sibling (`allOf`) children from observing each other's annotations.
#[derive(Clone, Debug)]
pub(crate) struct EvaluationContext {
    /// Annotations accumulated by upstream pipeline stages, visible to
    /// unevaluated coordinators below this point.
    pub(crate) seed: Evaluation,
    /// References currently being followed for the value under validation.
    /// Reset on descent into a member value, so only reference chains that
    /// consume no input are ever on the stack together.
    pub(crate) reference_stack: Vec<String>,
    /// Dynamic scope, outermost resource first.
    pub(crate) dynamic_scope: Vec<ScopeEntry>,
    pub(crate) config: Arc<ValidationOptions>,
    pub(crate) resolver: Arc<ResolverPool>,
    pub(crate) root: Arc<Value>,
    pub(crate) vocabularies: Arc<VocabularySet>,
    cancel: Option<Arc<AtomicBool>>,
}

impl EvaluationContext {
    pub(crate) fn new(
        config: Arc<ValidationOptions>,
        resolver: Arc<ResolverPool>,
        root: Arc<Value>,
        vocabularies: Arc<VocabularySet>,
        dynamic_scope: Vec<ScopeEntry>,
    ) -> Self {
        let cancel = config.cancellation.clone();
        EvaluationContext {
            seed: Evaluation::None,
            reference_stack: Vec::new(),
            dynamic_scope,
            config,
            resolver,
            root,
            vocabularies,
            cancel,
        }
    }

    /// Derive a context carrying the given upstream annotations.
    pub(crate) fn with_seed(&self, seed: Evaluation) -> Self {
        let mut derived = self.clone();
        derived.seed = seed;
        derived
    }

    /// Derive the context for validating a member value (an object property
    /// or an array item). Upstream annotations and the reference trail apply
    /// to the enclosing value, not to its members.
    pub(crate) fn for_member(&self) -> Self {
        let mut derived = self.clone();
        derived.seed = Evaluation::None;
        derived.reference_stack.clear();
        derived
    }

    /// Derive a context with `reference` pushed onto the reference trail.
    pub(crate) fn with_reference(&self, reference: String) -> Self {
        let mut derived = self.clone();
        derived.reference_stack.push(reference);
        derived
    }

    /// Derive a context with a resource pushed onto the dynamic scope.
    pub(crate) fn with_scope(&self, entry: ScopeEntry) -> Self {
        let mut derived = self.clone();
        derived.dynamic_scope.push(entry);
        derived
    }

    pub(crate) fn is_reference_active(&self, reference: &str) -> bool {
        self.reference_stack.iter().any(|entry| entry == reference)
    }

    /// Check the caller's cancellation flag. Composite validators call this
    /// between children, array validators between items, object validators
    /// between properties.
    pub(crate) fn check_cancelled<'i>(
        &self,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<(), ValidationError<'i>> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => {
                Err(ValidationError::cancelled(path.into(), instance))
            }
            _ => Ok(()),
        }
    }
}
