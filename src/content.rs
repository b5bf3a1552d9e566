//! Registries for `contentMediaType` and `contentEncoding`.
//!
//! Both are keyed by name so that adding support for another media type or
//! encoding is a table entry, not a new code path in the validator.
use ahash::AHashMap;
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE},
    Engine,
};
use once_cell::sync::Lazy;
use serde_json::Value;

/// Check whether a decoded document conforms to the media type.
pub(crate) type MediaTypeCheck = fn(&str) -> bool;
/// Parse a decoded document into a JSON value, if the media type maps to one.
pub(crate) type MediaTypeParse = fn(&str) -> Option<Value>;
/// Decode a string per the encoding, returning the raw bytes.
pub(crate) type EncodingDecode = fn(&str) -> Option<Vec<u8>>;

pub(crate) static MEDIA_TYPES: Lazy<AHashMap<&'static str, (MediaTypeCheck, MediaTypeParse)>> =
    Lazy::new(|| {
        let mut media_types: AHashMap<&'static str, (MediaTypeCheck, MediaTypeParse)> =
            AHashMap::with_capacity(1);
        media_types.insert("application/json", (is_json, parse_json));
        media_types
    });

pub(crate) static ENCODINGS: Lazy<AHashMap<&'static str, EncodingDecode>> = Lazy::new(|| {
    let mut encodings: AHashMap<&'static str, EncodingDecode> = AHashMap::with_capacity(2);
    encodings.insert("base64", decode_base64);
    encodings.insert("base64url", decode_base64url);
    encodings
});

fn is_json(content: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(content).is_ok()
}

fn parse_json(content: &str) -> Option<Value> {
    serde_json::from_str(content).ok()
}

fn decode_base64(content: &str) -> Option<Vec<u8>> {
    STANDARD.decode(content).ok()
}

fn decode_base64url(content: &str) -> Option<Vec<u8>> {
    URL_SAFE.decode(content).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_media_type_checks() {
        let (check, parse) = MEDIA_TYPES["application/json"];
        assert!(check("{\"a\": 1}"));
        assert!(!check("{"));
        assert_eq!(parse("[1, 2]"), Some(serde_json::json!([1, 2])));
    }

    #[test]
    fn base64_round_trip() {
        let decode = ENCODINGS["base64"];
        assert_eq!(decode("aGVsbG8="), Some(b"hello".to_vec()));
        assert_eq!(decode("not base64!"), None);
    }

    #[test]
    fn base64url_uses_the_url_safe_alphabet() {
        let decode = ENCODINGS["base64url"];
        assert_eq!(decode("_w=="), Some(vec![0xff]));
        assert_eq!(ENCODINGS["base64"]("_w=="), None);
    }
}
