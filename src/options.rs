//! Configuration for schema compilation and validation.
use std::{
    fmt,
    sync::{atomic::AtomicBool, Arc},
};

use ahash::AHashMap;
use serde_json::Value;

use crate::{
    compiler,
    error::ValidationError,
    resolver::ReferenceResolver,
    validators::format::Format,
    vocabulary::VocabularySet,
    Validator,
};

/// Builder-style options for [`crate::validator_for`]-equivalent
/// compilation with customization.
///
/// ```rust
/// use serde_json::json;
///
/// let validator = jsonschema_core::options()
///     .should_validate_formats(true)
///     .build(&json!({"format": "uuid"}))
///     .expect("valid schema");
/// assert!(validator.is_valid(&json!("f81d4fae-7dec-11d0-a765-00a0c91e6bf6")));
/// assert!(!validator.is_valid(&json!("not a uuid")));
/// ```
#[derive(Clone, Default)]
pub struct ValidationOptions {
    pub(crate) resolver: Option<Arc<dyn ReferenceResolver>>,
    pub(crate) resources: AHashMap<String, Arc<Value>>,
    pub(crate) vocabulary_set: Option<VocabularySet>,
    pub(crate) base_uri: Option<String>,
    pub(crate) root_schema: Option<Arc<Value>>,
    pub(crate) validate_formats: Option<bool>,
    pub(crate) formats: AHashMap<String, Arc<dyn Format>>,
    pub(crate) assert_content: bool,
    pub(crate) cancellation: Option<Arc<AtomicBool>>,
}

impl ValidationOptions {
    /// Build a validator from `schema` with these options.
    pub fn build(&self, schema: &Value) -> Result<Validator, ValidationError<'static>> {
        compiler::build(self.clone(), schema)
    }

    /// Install a resolver for references the schema itself cannot satisfy.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl ReferenceResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Make an extra schema document addressable under `uri` during
    /// reference resolution.
    #[must_use]
    pub fn with_resource(mut self, uri: impl Into<String>, schema: Value) -> Self {
        self.resources.insert(uri.into(), Arc::new(schema));
        self
    }

    /// Override the vocabulary set instead of deriving it from the schema.
    #[must_use]
    pub fn with_vocabularies(mut self, vocabularies: VocabularySet) -> Self {
        self.vocabulary_set = Some(vocabularies);
        self
    }

    /// Set the base URI used to resolve relative references when the schema
    /// has no absolute `$id`.
    #[must_use]
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Compile against this root schema instead of the input document;
    /// useful when compiling a subschema of a larger document.
    #[must_use]
    pub fn with_root_schema(mut self, root: Value) -> Self {
        self.root_schema = Some(Arc::new(root));
        self
    }

    /// Force `format` assertion on or off, overriding the vocabulary set.
    #[must_use]
    pub fn should_validate_formats(mut self, validate: bool) -> Self {
        self.validate_formats = Some(validate);
        self
    }

    /// Register a custom format checker; it shadows a built-in of the same
    /// name.
    #[must_use]
    pub fn with_format<F>(mut self, name: impl Into<String>, format: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.formats.insert(name.into(), Arc::new(format));
        self
    }

    /// Turn content-vocabulary annotations (`contentEncoding`,
    /// `contentMediaType`, `contentSchema`) into assertions.
    #[must_use]
    pub fn assert_content(mut self, assert: bool) -> Self {
        self.assert_content = assert;
        self
    }

    /// Install a cancellation flag; raising it makes in-flight validations
    /// fail with [`crate::ValidationErrorKind::Cancelled`] at the next
    /// composite boundary.
    #[must_use]
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(flag);
        self
    }
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("resolver", &self.resolver.is_some())
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("vocabulary_set", &self.vocabulary_set)
            .field("base_uri", &self.base_uri)
            .field("validate_formats", &self.validate_formats)
            .field("formats", &self.formats.keys().collect::<Vec<_>>())
            .field("assert_content", &self.assert_content)
            .field("cancellation", &self.cancellation.is_some())
            .finish()
    }
}
