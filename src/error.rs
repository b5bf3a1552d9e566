//! Error types.
use crate::{
    paths::JsonPointer,
    primitive_type::{PrimitiveType, PrimitiveTypesBitMap},
};
use serde_json::Value;
use std::{borrow::Cow, error, fmt};

/// An error returned from schema compilation or validation.
///
/// Validation is fail-fast: the first violation discovered along the
/// pre-order traversal of the validator tree is returned.
#[derive(Clone, Debug)]
pub struct ValidationError<'a> {
    /// Value that failed validation.
    pub instance: Cow<'a, Value>,
    /// Kind of the failure.
    pub kind: ValidationErrorKind,
    /// Location of the failing value within the instance.
    pub instance_path: JsonPointer,
    /// Location of the violated keyword within the schema.
    pub schema_path: JsonPointer,
}

/// Kinds of failures that compilation or validation can produce.
#[derive(Clone, Debug)]
pub enum ValidationErrorKind {
    /// The value's JSON type is not among the expected ones.
    TypeMismatch {
        /// Expected type or set of types.
        expected: TypeKind,
    },
    /// A numeric or size bound was violated.
    OutOfRange {
        /// The violated keyword.
        keyword: &'static str,
        /// The bound carried by that keyword.
        limit: Value,
    },
    /// The string does not match the `pattern` regex.
    PatternMismatch {
        /// The source pattern.
        pattern: String,
    },
    /// The string does not conform to an asserted `format`.
    FormatMismatch {
        /// The format name.
        format: String,
    },
    /// The value is not one of the `enum` options.
    EnumMismatch {
        /// The allowed options.
        options: Value,
    },
    /// The value differs from the `const` value.
    ConstMismatch {
        /// The expected value.
        expected: Value,
    },
    /// A `required` (or `dependentRequired`) property is absent.
    MissingRequired {
        /// The missing property name.
        property: String,
    },
    /// Properties not covered by `properties`/`patternProperties` are
    /// forbidden by `additionalProperties`.
    AdditionalNotAllowed {
        /// The offending property names.
        unexpected: Vec<String>,
    },
    /// Members that no schema evaluated are forbidden by
    /// `unevaluatedProperties`/`unevaluatedItems`.
    UnevaluatedNotAllowed {
        /// The offending members.
        unexpected: UnexpectedMembers,
    },
    /// `uniqueItems` found two equal elements.
    UniquenessViolation {
        /// Index of the first element of the duplicate pair.
        first: usize,
        /// Index of the second element of the duplicate pair.
        second: usize,
    },
    /// The number of items matching `contains` is outside
    /// `minContains`/`maxContains`.
    ContainsViolation {
        /// How many items matched.
        matched: usize,
        /// The minimum required number of matches.
        min: u64,
        /// The maximum allowed number of matches, if bounded.
        max: Option<u64>,
    },
    /// An `allOf`/`anyOf`/`oneOf` requirement was not met.
    CompositionFailed {
        /// Which composition keyword failed.
        composition: Composition,
        /// How many subschemas matched.
        matched: usize,
    },
    /// The value matched a schema negated by `not`.
    NotViolated,
    /// A reference chain loops back onto itself.
    CircularReference {
        /// The reference that closed the cycle.
        reference: String,
    },
    /// A reference target could not be found.
    UnresolvedReference {
        /// The reference as written in the schema.
        reference: String,
    },
    /// A fragment is not a valid JSON pointer.
    InvalidPointer {
        /// The offending fragment.
        pointer: String,
    },
    /// An external resolver failed to retrieve a document.
    FetchFailed {
        /// The reference being retrieved.
        reference: String,
        /// Resolver-supplied detail.
        detail: String,
    },
    /// A `pattern` or `patternProperties` regex failed to compile.
    InvalidRegex {
        /// The offending pattern.
        pattern: String,
    },
    /// A keyword value is malformed (wrong type, negative bound, ...).
    InvalidSchema {
        /// Human-readable description of the defect.
        detail: Cow<'static, str>,
    },
    /// The caller's cancellation flag was raised mid-validation.
    Cancelled,
}

/// Expected type(s) carried by a [`ValidationErrorKind::TypeMismatch`].
#[derive(Clone, Copy, Debug)]
pub enum TypeKind {
    /// A single expected type.
    Single(PrimitiveType),
    /// A set of acceptable types.
    Multiple(PrimitiveTypesBitMap),
}

/// The composition keyword behind a [`ValidationErrorKind::CompositionFailed`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum Composition {
    AllOf,
    AnyOf,
    OneOf,
}

/// Members rejected by `unevaluatedProperties`/`unevaluatedItems`.
#[derive(Clone, Debug)]
pub enum UnexpectedMembers {
    /// Offending object property names.
    Properties(Vec<String>),
    /// Offending array indices.
    Items(Vec<usize>),
}

impl<'a> ValidationError<'a> {
    /// Convert the error into one that owns its data.
    #[must_use]
    pub fn into_owned(self) -> ValidationError<'static> {
        ValidationError {
            instance: Cow::Owned(self.instance.into_owned()),
            kind: self.kind,
            instance_path: self.instance_path,
            schema_path: self.schema_path,
        }
    }

    pub(crate) const fn type_mismatch(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
        expected: PrimitiveType,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::TypeMismatch {
                expected: TypeKind::Single(expected),
            },
            instance_path,
            schema_path,
        }
    }

    pub(crate) const fn multiple_type_mismatch(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
        expected: PrimitiveTypesBitMap,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::TypeMismatch {
                expected: TypeKind::Multiple(expected),
            },
            instance_path,
            schema_path,
        }
    }

    pub(crate) const fn out_of_range(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
        keyword: &'static str,
        limit: Value,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::OutOfRange { keyword, limit },
            instance_path,
            schema_path,
        }
    }

    pub(crate) fn pattern_mismatch(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
        pattern: &str,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::PatternMismatch {
                pattern: pattern.to_string(),
            },
            instance_path,
            schema_path,
        }
    }

    pub(crate) fn format_mismatch(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
        format: &str,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::FormatMismatch {
                format: format.to_string(),
            },
            instance_path,
            schema_path,
        }
    }

    pub(crate) fn enum_mismatch(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
        options: &[Value],
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::EnumMismatch {
                options: Value::Array(options.to_vec()),
            },
            instance_path,
            schema_path,
        }
    }

    pub(crate) fn const_mismatch(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
        expected: &Value,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::ConstMismatch {
                expected: expected.clone(),
            },
            instance_path,
            schema_path,
        }
    }

    pub(crate) fn missing_required(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
        property: &str,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::MissingRequired {
                property: property.to_string(),
            },
            instance_path,
            schema_path,
        }
    }

    pub(crate) const fn additional_not_allowed(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
        unexpected: Vec<String>,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::AdditionalNotAllowed { unexpected },
            instance_path,
            schema_path,
        }
    }

    pub(crate) const fn unevaluated_not_allowed(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
        unexpected: UnexpectedMembers,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::UnevaluatedNotAllowed { unexpected },
            instance_path,
            schema_path,
        }
    }

    pub(crate) const fn uniqueness_violation(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
        first: usize,
        second: usize,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::UniquenessViolation { first, second },
            instance_path,
            schema_path,
        }
    }

    pub(crate) const fn contains_violation(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
        matched: usize,
        min: u64,
        max: Option<u64>,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::ContainsViolation { matched, min, max },
            instance_path,
            schema_path,
        }
    }

    pub(crate) const fn composition_failed(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
        composition: Composition,
        matched: usize,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::CompositionFailed {
                composition,
                matched,
            },
            instance_path,
            schema_path,
        }
    }

    pub(crate) const fn not_violated(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        instance: &'a Value,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::NotViolated,
            instance_path,
            schema_path,
        }
    }

    pub(crate) fn circular_reference(
        schema_path: JsonPointer,
        reference: &str,
    ) -> ValidationError<'static> {
        ValidationError {
            instance: Cow::Owned(Value::Null),
            kind: ValidationErrorKind::CircularReference {
                reference: reference.to_string(),
            },
            instance_path: JsonPointer::default(),
            schema_path,
        }
    }

    pub(crate) fn unresolved_reference(
        schema_path: JsonPointer,
        reference: &str,
    ) -> ValidationError<'static> {
        ValidationError {
            instance: Cow::Owned(Value::Null),
            kind: ValidationErrorKind::UnresolvedReference {
                reference: reference.to_string(),
            },
            instance_path: JsonPointer::default(),
            schema_path,
        }
    }

    pub(crate) fn invalid_regex(
        schema_path: JsonPointer,
        pattern: &str,
    ) -> ValidationError<'static> {
        ValidationError {
            instance: Cow::Owned(Value::Null),
            kind: ValidationErrorKind::InvalidRegex {
                pattern: pattern.to_string(),
            },
            instance_path: JsonPointer::default(),
            schema_path,
        }
    }

    pub(crate) fn invalid_schema(
        schema_path: JsonPointer,
        detail: impl Into<Cow<'static, str>>,
    ) -> ValidationError<'static> {
        ValidationError {
            instance: Cow::Owned(Value::Null),
            kind: ValidationErrorKind::InvalidSchema {
                detail: detail.into(),
            },
            instance_path: JsonPointer::default(),
            schema_path,
        }
    }

    pub(crate) const fn cancelled(
        instance_path: JsonPointer,
        instance: &'a Value,
    ) -> ValidationError<'a> {
        ValidationError {
            instance: Cow::Borrowed(instance),
            kind: ValidationErrorKind::Cancelled,
            instance_path,
            schema_path: JsonPointer::empty(),
        }
    }
}

impl fmt::Display for ValidationError<'_> {
    #[allow(clippy::too_many_lines)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValidationErrorKind::TypeMismatch { expected } => match expected {
                TypeKind::Single(primitive_type) => {
                    write!(f, "{} is not of type \"{primitive_type}\"", self.instance)
                }
                TypeKind::Multiple(types) => {
                    write!(f, "{} is not of type {types}", self.instance)
                }
            },
            ValidationErrorKind::OutOfRange { keyword, limit } => match *keyword {
                "minLength" => write!(
                    f,
                    "{} is shorter than {limit} characters",
                    self.instance
                ),
                "maxLength" => write!(f, "{} is longer than {limit} characters", self.instance),
                "minimum" => write!(
                    f,
                    "{} is less than the minimum of {limit}",
                    self.instance
                ),
                "maximum" => write!(
                    f,
                    "{} is greater than the maximum of {limit}",
                    self.instance
                ),
                "exclusiveMinimum" => write!(
                    f,
                    "{} is less than or equal to the exclusive minimum of {limit}",
                    self.instance
                ),
                "exclusiveMaximum" => write!(
                    f,
                    "{} is greater than or equal to the exclusive maximum of {limit}",
                    self.instance
                ),
                "multipleOf" => write!(f, "{} is not a multiple of {limit}", self.instance),
                "minItems" => write!(f, "{} has less than {limit} items", self.instance),
                "maxItems" => write!(f, "{} has more than {limit} items", self.instance),
                "minProperties" => {
                    write!(f, "{} has less than {limit} properties", self.instance)
                }
                "maxProperties" => {
                    write!(f, "{} has more than {limit} properties", self.instance)
                }
                _ => write!(
                    f,
                    "{} violates the \"{keyword}\" bound of {limit}",
                    self.instance
                ),
            },
            ValidationErrorKind::PatternMismatch { pattern } => {
                write!(f, "{} does not match \"{pattern}\"", self.instance)
            }
            ValidationErrorKind::FormatMismatch { format } => {
                write!(f, "{} is not a \"{format}\"", self.instance)
            }
            ValidationErrorKind::EnumMismatch { options } => {
                write!(f, "{} is not one of {options}", self.instance)
            }
            ValidationErrorKind::ConstMismatch { expected } => {
                write!(f, "{expected} was expected")
            }
            ValidationErrorKind::MissingRequired { property } => {
                write!(f, "\"{property}\" is a required property")
            }
            ValidationErrorKind::AdditionalNotAllowed { unexpected } => {
                write!(f, "Additional properties are not allowed (")?;
                write_property_list(f, unexpected)?;
                if unexpected.len() == 1 {
                    f.write_str(" was unexpected)")
                } else {
                    f.write_str(" were unexpected)")
                }
            }
            ValidationErrorKind::UnevaluatedNotAllowed { unexpected } => match unexpected {
                UnexpectedMembers::Properties(properties) => {
                    write!(f, "Unevaluated properties are not allowed (")?;
                    write_property_list(f, properties)?;
                    if properties.len() == 1 {
                        f.write_str(" was unexpected)")
                    } else {
                        f.write_str(" were unexpected)")
                    }
                }
                UnexpectedMembers::Items(indices) => {
                    write!(f, "Unevaluated items are not allowed (indices ")?;
                    let mut first = true;
                    for index in indices {
                        if !first {
                            f.write_str(", ")?;
                        }
                        write!(f, "{index}")?;
                        first = false;
                    }
                    f.write_str(")")
                }
            },
            ValidationErrorKind::UniquenessViolation { first, second } => write!(
                f,
                "{} has non-unique elements (indices {first} and {second})",
                self.instance
            ),
            ValidationErrorKind::ContainsViolation { matched, min, max } => {
                if let Some(max) = max {
                    if *matched as u64 > *max {
                        return write!(
                            f,
                            "{} contains {matched} matching items, expected at most {max}",
                            self.instance
                        );
                    }
                }
                write!(
                    f,
                    "{} contains {matched} matching items, expected at least {min}",
                    self.instance
                )
            }
            ValidationErrorKind::CompositionFailed {
                composition,
                matched,
            } => match composition {
                Composition::AllOf => write!(
                    f,
                    "{} is not valid under all of the given schemas",
                    self.instance
                ),
                Composition::AnyOf => write!(
                    f,
                    "{} is not valid under any of the given schemas",
                    self.instance
                ),
                Composition::OneOf => {
                    if *matched == 0 {
                        write!(
                            f,
                            "{} is not valid under any of the given schemas",
                            self.instance
                        )
                    } else {
                        write!(
                            f,
                            "{} is valid under {matched} of the given schemas, expected exactly one",
                            self.instance
                        )
                    }
                }
            },
            ValidationErrorKind::NotViolated => {
                write!(f, "{} is not allowed", self.instance)
            }
            ValidationErrorKind::CircularReference { reference } => {
                write!(f, "circular reference detected: \"{reference}\"")
            }
            ValidationErrorKind::UnresolvedReference { reference } => {
                write!(f, "\"{reference}\" cannot be resolved")
            }
            ValidationErrorKind::InvalidPointer { pointer } => {
                write!(f, "\"{pointer}\" is not a valid JSON pointer")
            }
            ValidationErrorKind::FetchFailed { reference, detail } => {
                write!(f, "failed to retrieve \"{reference}\": {detail}")
            }
            ValidationErrorKind::InvalidRegex { pattern } => {
                write!(f, "\"{pattern}\" is not a valid regular expression")
            }
            ValidationErrorKind::InvalidSchema { detail } => f.write_str(detail),
            ValidationErrorKind::Cancelled => f.write_str("validation was cancelled"),
        }
    }
}

fn write_property_list(f: &mut fmt::Formatter<'_>, properties: &[String]) -> fmt::Result {
    let mut first = true;
    for property in properties {
        if !first {
            f.write_str(", ")?;
        }
        write!(f, "'{property}'")?;
        first = false;
    }
    Ok(())
}

impl error::Error for ValidationError<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::JsonPointer;
    use serde_json::json;

    #[test]
    fn out_of_range_messages_carry_the_bound() {
        let instance = json!("abcde");
        let error = ValidationError::out_of_range(
            JsonPointer::default(),
            JsonPointer::default(),
            &instance,
            "maxLength",
            json!(4),
        );
        assert_eq!(error.to_string(), "\"abcde\" is longer than 4 characters");
    }

    #[test]
    fn additional_properties_message_lists_offenders() {
        let instance = json!({"a": 1, "b": 2});
        let error = ValidationError::additional_not_allowed(
            JsonPointer::default(),
            JsonPointer::default(),
            &instance,
            vec!["a".to_string(), "b".to_string()],
        );
        assert_eq!(
            error.to_string(),
            "Additional properties are not allowed ('a', 'b' were unexpected)"
        );
    }

    #[test]
    fn type_mismatch_message_names_the_type() {
        let instance = json!(123);
        let error = ValidationError::type_mismatch(
            JsonPointer::default(),
            JsonPointer::default(),
            &instance,
            crate::PrimitiveType::String,
        );
        assert_eq!(error.to_string(), "123 is not of type \"string\"");
    }

    #[test]
    fn uniqueness_message_names_indices() {
        let instance = json!([1, 2, 1]);
        let error = ValidationError::uniqueness_violation(
            JsonPointer::default(),
            JsonPointer::default(),
            &instance,
            0,
            2,
        );
        assert_eq!(
            error.to_string(),
            "[1,2,1] has non-unique elements (indices 0 and 2)"
        );
    }
}
