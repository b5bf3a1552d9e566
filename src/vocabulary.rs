//! Draft 2020-12 vocabularies and keyword gating.
//!
//! Every keyword belongs to exactly one vocabulary; a keyword is compiled
//! only when its vocabulary is enabled in the active [`VocabularySet`].
//! Unknown keywords belong to no vocabulary and are treated as annotations,
//! which for compilation purposes means "enabled".
use ahash::AHashMap;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use crate::{error::ValidationError, paths::JsonPointer};

/// A draft 2020-12 vocabulary.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[allow(missing_docs)]
pub enum Vocabulary {
    Core,
    Applicator,
    Unevaluated,
    Validation,
    FormatAnnotation,
    FormatAssertion,
    Content,
    MetaData,
}

impl Vocabulary {
    const ALL: [Vocabulary; 8] = [
        Vocabulary::Core,
        Vocabulary::Applicator,
        Vocabulary::Unevaluated,
        Vocabulary::Validation,
        Vocabulary::FormatAnnotation,
        Vocabulary::FormatAssertion,
        Vocabulary::Content,
        Vocabulary::MetaData,
    ];

    /// The canonical URI identifying this vocabulary.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Vocabulary::Core => "https://json-schema.org/draft/2020-12/vocab/core",
            Vocabulary::Applicator => "https://json-schema.org/draft/2020-12/vocab/applicator",
            Vocabulary::Unevaluated => "https://json-schema.org/draft/2020-12/vocab/unevaluated",
            Vocabulary::Validation => "https://json-schema.org/draft/2020-12/vocab/validation",
            Vocabulary::FormatAnnotation => {
                "https://json-schema.org/draft/2020-12/vocab/format-annotation"
            }
            Vocabulary::FormatAssertion => {
                "https://json-schema.org/draft/2020-12/vocab/format-assertion"
            }
            Vocabulary::Content => "https://json-schema.org/draft/2020-12/vocab/content",
            Vocabulary::MetaData => "https://json-schema.org/draft/2020-12/vocab/meta-data",
        }
    }

    /// Look a vocabulary up by its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Vocabulary> {
        Vocabulary::ALL
            .into_iter()
            .find(|vocabulary| vocabulary.uri() == uri)
    }

    const fn bit(self) -> u8 {
        match self {
            Vocabulary::Core => 1,
            Vocabulary::Applicator => 1 << 1,
            Vocabulary::Unevaluated => 1 << 2,
            Vocabulary::Validation => 1 << 3,
            Vocabulary::FormatAnnotation => 1 << 4,
            Vocabulary::FormatAssertion => 1 << 5,
            Vocabulary::Content => 1 << 6,
            Vocabulary::MetaData => 1 << 7,
        }
    }
}

/// The set of enabled vocabularies for one compilation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VocabularySet {
    mask: u8,
}

impl Default for VocabularySet {
    /// Everything the 2020-12 metaschema lists, with format assertion off.
    fn default() -> Self {
        let mut set = VocabularySet::empty();
        for vocabulary in Vocabulary::ALL {
            if vocabulary != Vocabulary::FormatAssertion {
                set.enable(vocabulary);
            }
        }
        set
    }
}

impl VocabularySet {
    /// A set with no vocabularies enabled.
    #[must_use]
    pub const fn empty() -> Self {
        VocabularySet { mask: 0 }
    }

    /// Enable a vocabulary.
    pub fn enable(&mut self, vocabulary: Vocabulary) -> &mut Self {
        self.mask |= vocabulary.bit();
        self
    }

    /// Disable a vocabulary.
    pub fn disable(&mut self, vocabulary: Vocabulary) -> &mut Self {
        self.mask &= !vocabulary.bit();
        self
    }

    /// Whether a vocabulary is enabled.
    #[must_use]
    pub const fn contains(&self, vocabulary: Vocabulary) -> bool {
        self.mask & vocabulary.bit() != 0
    }

    /// Derive a set from a `$vocabulary` object: listed known vocabularies
    /// become the set, unknown-but-required URIs fail compilation, unknown
    /// optional URIs are ignored.
    pub(crate) fn from_metaschema(
        vocabularies: &Map<String, Value>,
    ) -> Result<Self, ValidationError<'static>> {
        let mut set = VocabularySet::empty();
        for (uri, required) in vocabularies {
            match Vocabulary::from_uri(uri) {
                Some(vocabulary) => {
                    set.enable(vocabulary);
                }
                None => {
                    if required.as_bool() == Some(true) {
                        return Err(ValidationError::invalid_schema(
                            JsonPointer::default().join("$vocabulary"),
                            format!("unknown required vocabulary \"{uri}\""),
                        ));
                    }
                }
            }
        }
        Ok(set)
    }

    /// Whether the vocabulary owning `keyword` is enabled. Keywords owned by
    /// no vocabulary default to enabled.
    #[must_use]
    pub fn keyword_enabled(&self, keyword: &str) -> bool {
        match KEYWORD_VOCABULARIES.get(keyword) {
            Some(vocabulary) => self.contains(*vocabulary),
            None => true,
        }
    }
}

static KEYWORD_VOCABULARIES: Lazy<AHashMap<&'static str, Vocabulary>> = Lazy::new(|| {
    let mut keywords = AHashMap::with_capacity(48);
    for keyword in [
        "$id",
        "$schema",
        "$ref",
        "$anchor",
        "$dynamicRef",
        "$dynamicAnchor",
        "$vocabulary",
        "$comment",
        "$defs",
    ] {
        keywords.insert(keyword, Vocabulary::Core);
    }
    for keyword in [
        "allOf",
        "anyOf",
        "oneOf",
        "not",
        "if",
        "then",
        "else",
        "dependentSchemas",
        "prefixItems",
        "items",
        "additionalItems",
        "contains",
        "properties",
        "patternProperties",
        "additionalProperties",
        "propertyNames",
    ] {
        keywords.insert(keyword, Vocabulary::Applicator);
    }
    for keyword in ["unevaluatedItems", "unevaluatedProperties"] {
        keywords.insert(keyword, Vocabulary::Unevaluated);
    }
    for keyword in [
        "type",
        "enum",
        "const",
        "multipleOf",
        "maximum",
        "exclusiveMaximum",
        "minimum",
        "exclusiveMinimum",
        "maxLength",
        "minLength",
        "pattern",
        "maxItems",
        "minItems",
        "uniqueItems",
        "maxContains",
        "minContains",
        "maxProperties",
        "minProperties",
        "required",
        "dependentRequired",
    ] {
        keywords.insert(keyword, Vocabulary::Validation);
    }
    keywords.insert("format", Vocabulary::FormatAnnotation);
    for keyword in ["contentEncoding", "contentMediaType", "contentSchema"] {
        keywords.insert(keyword, Vocabulary::Content);
    }
    for keyword in [
        "title",
        "description",
        "default",
        "deprecated",
        "readOnly",
        "writeOnly",
        "examples",
    ] {
        keywords.insert(keyword, Vocabulary::MetaData);
    }
    keywords
});

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_set_excludes_format_assertion() {
        let set = VocabularySet::default();
        assert!(set.contains(Vocabulary::Core));
        assert!(set.contains(Vocabulary::FormatAnnotation));
        assert!(!set.contains(Vocabulary::FormatAssertion));
    }

    #[test]
    fn keyword_gating_follows_the_owning_vocabulary() {
        let mut set = VocabularySet::default();
        assert!(set.keyword_enabled("minimum"));
        set.disable(Vocabulary::Validation);
        assert!(!set.keyword_enabled("minimum"));
        assert!(set.keyword_enabled("allOf"));
        // Unknown keywords default to enabled.
        assert!(set.keyword_enabled("x-custom"));
    }

    #[test]
    fn metaschema_with_unknown_required_vocabulary_fails() {
        let vocabularies = json!({
            "https://json-schema.org/draft/2020-12/vocab/core": true,
            "https://example.com/vocab/custom": true
        });
        let error = VocabularySet::from_metaschema(vocabularies.as_object().unwrap());
        assert!(error.is_err());
    }

    #[test]
    fn metaschema_with_unknown_optional_vocabulary_is_ignored() {
        let vocabularies = json!({
            "https://json-schema.org/draft/2020-12/vocab/core": true,
            "https://json-schema.org/draft/2020-12/vocab/validation": true,
            "https://example.com/vocab/custom": false
        });
        let set = VocabularySet::from_metaschema(vocabularies.as_object().unwrap()).unwrap();
        assert!(set.contains(Vocabulary::Core));
        assert!(set.contains(Vocabulary::Validation));
        assert!(!set.contains(Vocabulary::Applicator));
    }
}
