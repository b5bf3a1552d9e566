//! A JSON Schema draft 2020-12 validation engine.
//!
//! Schemas compile once into an immutable validator tree; validation is
//! fail-fast and returns either the first violation or the annotations
//! (evaluated properties and items) produced along the way.
//!
//! # Validation
//!
//! One-off checks go through [`is_valid`] / [`validate`]:
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({"type": "string", "minLength": 2});
//! assert!(jsonschema_core::is_valid(&schema, &json!("ok")));
//! assert!(!jsonschema_core::is_valid(&schema, &json!("x")));
//! ```
//!
//! Reusable validators are built with [`validator_for`]:
//!
//! ```rust
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {"name": {"type": "string"}},
//!     "unevaluatedProperties": false
//! });
//! let validator = jsonschema_core::validator_for(&schema).expect("valid schema");
//!
//! assert!(validator.is_valid(&json!({"name": "Ada"})));
//! if let Err(error) = validator.validate(&json!({"name": 1})) {
//!     assert_eq!(error.to_string(), "1 is not of type \"string\"");
//! }
//! ```
//!
//! # Configuration
//!
//! [`options`] returns a builder for resolvers, extra resources, vocabulary
//! overrides, formats, content assertion, and cancellation; see
//! [`ValidationOptions`].
use std::sync::Arc;

use serde_json::Value;

mod compiler;
mod content;
mod context;
mod ecma;
mod error;
mod evaluation;
mod options;
mod paths;
mod primitive_type;
mod resolver;
mod uri;
mod validators;
mod vocabulary;

pub use error::{
    Composition, TypeKind, UnexpectedMembers, ValidationError, ValidationErrorKind,
};
pub use evaluation::{ArrayEvaluation, Evaluation, IndexBitSet, ObjectEvaluation};
pub use options::ValidationOptions;
pub use paths::{JsonPointer, PathChunk};
pub use primitive_type::{PrimitiveType, PrimitiveTypesBitMap};
pub use resolver::{ReferenceResolver, ResolveError};
pub use validators::format::Format;
pub use vocabulary::{Vocabulary, VocabularySet};

use context::{EvaluationContext, ScopeEntry};
use paths::InstancePath;
use resolver::ResolverPool;
use validators::{BoxedValidator, Validate};

/// A compiled JSON Schema.
///
/// Immutable once built; sharing it across threads and running independent
/// [`Validator::validate`] calls in parallel is safe. The only interior
/// state is the lazy compilation cache of reference nodes, which
/// initializes under a one-shot guard.
pub struct Validator {
    pub(crate) node: BoxedValidator,
    pub(crate) config: Arc<ValidationOptions>,
    pub(crate) resolver: Arc<ResolverPool>,
    pub(crate) root: Arc<Value>,
    pub(crate) vocabularies: Arc<VocabularySet>,
    pub(crate) scope: Vec<ScopeEntry>,
}

impl Validator {
    /// Validate `instance`, returning its annotations or the first
    /// violation found.
    pub fn validate<'i>(&self, instance: &'i Value) -> Result<Evaluation, ValidationError<'i>> {
        self.validate_with(instance, Evaluation::None)
    }

    /// Validate `instance` with pre-accumulated annotations, as when this
    /// schema participates in an outer evaluation whose marks its
    /// `unevaluatedProperties`/`unevaluatedItems` should respect.
    pub fn validate_with<'i>(
        &self,
        instance: &'i Value,
        evaluated: Evaluation,
    ) -> Result<Evaluation, ValidationError<'i>> {
        let ctx = EvaluationContext::new(
            Arc::clone(&self.config),
            Arc::clone(&self.resolver),
            Arc::clone(&self.root),
            Arc::clone(&self.vocabularies),
            self.scope.clone(),
        )
        .with_seed(evaluated);
        self.node.validate(&ctx, instance, &InstancePath::new())
    }

    /// Whether `instance` conforms to the schema.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validate(instance).is_ok()
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("vocabularies", &self.vocabularies)
            .field("config", &self.config)
            .finish()
    }
}

/// Compile `schema` with default options.
pub fn validator_for(schema: &Value) -> Result<Validator, ValidationError<'static>> {
    options().build(schema)
}

/// Create a default [`ValidationOptions`] builder.
#[must_use]
pub fn options() -> ValidationOptions {
    ValidationOptions::default()
}

/// Compile `schema` and check `instance` against it in one step.
///
/// Compilation failures count as "not valid"; build the validator
/// explicitly to distinguish them.
#[must_use]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    validator_for(schema).map_or(false, |validator| validator.is_valid(instance))
}

/// Compile `schema` and validate `instance`, returning annotations or the
/// first error.
pub fn validate<'i>(
    schema: &Value,
    instance: &'i Value,
) -> Result<Evaluation, ValidationError<'i>> {
    match validator_for(schema) {
        Ok(validator) => validator.validate(instance),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
pub(crate) mod tests_util {
    use super::*;

    #[track_caller]
    pub(crate) fn assert_valid(schema: &Value, instance: &Value) {
        let validator = validator_for(schema).expect("schema should compile");
        if let Err(error) = validator.validate(instance) {
            panic!("{instance} should be valid, got: {error}");
        }
    }

    #[track_caller]
    pub(crate) fn assert_not_valid(schema: &Value, instance: &Value) {
        let validator = validator_for(schema).expect("schema should compile");
        assert!(
            validator.validate(instance).is_err(),
            "{instance} should not be valid"
        );
    }

    #[track_caller]
    pub(crate) fn assert_error_kind(
        schema: &Value,
        instance: &Value,
        predicate: impl Fn(&ValidationErrorKind) -> bool,
    ) {
        let validator = validator_for(schema).expect("schema should compile");
        match validator.validate(instance) {
            Err(error) => assert!(
                predicate(&error.kind),
                "unexpected error kind: {:?}",
                error.kind
            ),
            Ok(_) => panic!("{instance} should not be valid"),
        }
    }

    #[track_caller]
    pub(crate) fn assert_compile_error_kind(
        schema: &Value,
        predicate: impl Fn(&ValidationErrorKind) -> bool,
    ) {
        match validator_for(schema) {
            Err(error) => assert!(
                predicate(&error.kind),
                "unexpected error kind: {:?}",
                error.kind
            ),
            Ok(_) => panic!("schema should not compile"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validators_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Validator>();
    }

    #[test]
    fn parallel_validation_shares_one_validator() {
        let schema = json!({
            "$ref": "#/$defs/item",
            "$defs": {"item": {"type": "integer", "minimum": 0}}
        });
        let validator = std::sync::Arc::new(validator_for(&schema).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|index| {
                let validator = std::sync::Arc::clone(&validator);
                std::thread::spawn(move || {
                    for value in 0..50 {
                        assert!(validator.is_valid(&json!(value + index)));
                        assert!(!validator.is_valid(&json!(-1)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn seeded_evaluations_feed_the_coordinator() {
        let schema = json!({"unevaluatedProperties": false});
        let validator = validator_for(&schema).unwrap();
        let instance = json!({"outer": 1});
        assert!(validator.validate(&instance).is_err());

        let mut seed = Evaluation::None;
        seed.mark_property("outer");
        assert!(validator.validate_with(&instance, seed).is_ok());
    }

    #[test]
    fn validation_does_not_mutate_the_instance() {
        let schema = json!({"properties": {"a": {"type": "integer"}}});
        let validator = validator_for(&schema).unwrap();
        let instance = json!({"a": 1, "b": [2, 3]});
        let before = instance.clone();
        let _ = validator.validate(&instance);
        assert_eq!(instance, before);
    }

    #[test]
    fn evaluations_only_name_present_members() {
        let schema = json!({
            "properties": {"a": true, "zz": true},
            "patternProperties": {"^b": true}
        });
        let validator = validator_for(&schema).unwrap();
        let instance = json!({"a": 1, "b1": 2});
        let evaluation = validator.validate(&instance).unwrap();
        let map = instance.as_object().unwrap();
        for key in evaluation.evaluated_properties().unwrap() {
            assert!(map.contains_key(key));
        }
    }
}
