//! `contentEncoding`, `contentMediaType`, `contentSchema`.
//!
//! In the 2020-12 default profile these keywords are annotations: the
//! decode → parse → validate chain runs, but its failures do not fail
//! validation unless assertion was explicitly requested through the
//! options. Unknown encodings and media types are always accepted.
use serde_json::{Map, Value};

use crate::{
    content::{EncodingDecode, MediaTypeCheck, MediaTypeParse, ENCODINGS, MEDIA_TYPES},
    context::EvaluationContext,
    error::ValidationError,
    evaluation::Evaluation,
    paths::{InstancePath, JsonPointer},
    validators::{BoxedValidator, CompilationResult, Validate},
};

pub(crate) struct ContentValidator {
    location: JsonPointer,
    encoding: Option<(String, EncodingDecode)>,
    media_type: Option<(String, MediaTypeCheck, MediaTypeParse)>,
    content_schema: Option<BoxedValidator>,
    assert: bool,
}

impl ContentValidator {
    pub(crate) fn compile(
        location: JsonPointer,
        parent: &Map<String, Value>,
        content_schema: Option<BoxedValidator>,
        assert: bool,
    ) -> CompilationResult {
        let encoding = match parent.get("contentEncoding") {
            Some(Value::String(name)) => ENCODINGS
                .get(name.as_str())
                .map(|decode| (name.clone(), *decode)),
            Some(_) => {
                return Err(ValidationError::invalid_schema(
                    location.join("contentEncoding"),
                    "\"contentEncoding\" must be a string",
                ))
            }
            None => None,
        };
        let media_type = match parent.get("contentMediaType") {
            Some(Value::String(name)) => MEDIA_TYPES
                .get(name.as_str())
                .map(|(check, parse)| (name.clone(), *check, *parse)),
            Some(_) => {
                return Err(ValidationError::invalid_schema(
                    location.join("contentMediaType"),
                    "\"contentMediaType\" must be a string",
                ))
            }
            None => None,
        };
        Ok(Box::new(ContentValidator {
            location,
            encoding,
            media_type,
            content_schema,
            assert,
        }))
    }
}

impl Validate for ContentValidator {
    fn validate<'i>(
        &self,
        ctx: &EvaluationContext,
        instance: &'i Value,
        path: &InstancePath<'_>,
    ) -> Result<Evaluation, ValidationError<'i>> {
        let Value::String(item) = instance else {
            return Ok(Evaluation::None);
        };
        let decoded: std::borrow::Cow<'_, str> = match &self.encoding {
            Some((name, decode)) => match decode(item).and_then(|bytes| String::from_utf8(bytes).ok()) {
                Some(decoded) => std::borrow::Cow::Owned(decoded),
                None => {
                    if self.assert {
                        return Err(ValidationError::format_mismatch(
                            self.location.join("contentEncoding"),
                            path.into(),
                            instance,
                            name,
                        ));
                    }
                    return Ok(Evaluation::None);
                }
            },
            None => std::borrow::Cow::Borrowed(item.as_str()),
        };
        let Some((name, check, parse)) = &self.media_type else {
            return Ok(Evaluation::None);
        };
        if !check(&decoded) {
            if self.assert {
                return Err(ValidationError::format_mismatch(
                    self.location.join("contentMediaType"),
                    path.into(),
                    instance,
                    name,
                ));
            }
            return Ok(Evaluation::None);
        }
        if let Some(content_schema) = &self.content_schema {
            if let Some(document) = parse(&decoded) {
                let result =
                    content_schema.validate(&ctx.for_member(), &document, &InstancePath::new());
                if self.assert {
                    if let Err(error) = result {
                        return Err(error.into_owned());
                    }
                }
            }
        }
        Ok(Evaluation::None)
    }
}
