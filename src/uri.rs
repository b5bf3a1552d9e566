//! Base-URI handling and JSON pointer fragments.
use percent_encoding::percent_decode_str;
use serde_json::Value;
use url::Url;

/// Base used for schemas that do not declare an `$id`. The scheme is
/// reserved so that a caller-provided base can always be told apart.
pub(crate) const DEFAULT_BASE: &str = "json-schema:///";

/// Resolve `reference` against `base` per RFC 3986, i.e. relative references
/// are interpreted against the scheme, authority, and directory portion of
/// the base URI.
pub(crate) fn resolve_against(base: &str, reference: &str) -> Option<String> {
    let base = Url::parse(base).or_else(|_| Url::parse(DEFAULT_BASE)).ok()?;
    let resolved = base.join(reference).ok()?;
    Some(resolved.into())
}

/// Split a URI into its fragment-less document part and an optional fragment.
pub(crate) fn split_fragment(uri: &str) -> (&str, Option<&str>) {
    match uri.split_once('#') {
        Some((document, fragment)) => (document, Some(fragment)),
        None => (uri, None),
    }
}

/// Whether a fragment addresses a location (`/...` or empty) rather than a
/// plain-name anchor.
pub(crate) fn is_pointer_fragment(fragment: &str) -> bool {
    fragment.is_empty() || fragment.starts_with('/')
}

/// Decode a JSON pointer fragment into its unescaped reference tokens.
/// Returns `None` when the fragment is not a syntactically valid pointer.
pub(crate) fn pointer_tokens(fragment: &str) -> Option<Vec<String>> {
    let decoded = percent_decode_str(fragment).decode_utf8().ok()?;
    if decoded.is_empty() {
        return Some(Vec::new());
    }
    if !decoded.starts_with('/') {
        return None;
    }
    let mut tokens = Vec::new();
    for raw in decoded[1..].split('/') {
        let mut token = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(ch) = chars.next() {
            if ch == '~' {
                match chars.next() {
                    Some('0') => token.push('~'),
                    Some('1') => token.push('/'),
                    _ => return None,
                }
            } else {
                token.push(ch);
            }
        }
        tokens.push(token);
    }
    Some(tokens)
}

/// Whether a raw (non-percent-encoded) string is a syntactically valid JSON
/// pointer: empty, or `/`-led tokens whose `~` escapes are `~0`/`~1`.
pub(crate) fn is_json_pointer(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if !value.starts_with('/') {
        return false;
    }
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '~' && !matches!(chars.next(), Some('0' | '1')) {
            return false;
        }
    }
    true
}

/// Follow a JSON pointer fragment into a document.
pub(crate) fn lookup_pointer<'v>(document: &'v Value, tokens: &[String]) -> Option<&'v Value> {
    let mut current = document;
    for token in tokens {
        current = match current {
            Value::Object(map) => map.get(token)?,
            Value::Array(items) => {
                if token != "0" && (token.starts_with('0') || token.starts_with('+')) {
                    return None;
                }
                items.get(token.parse::<usize>().ok()?)?
            }
            _ => return None,
        };
    }
    Some(current)
}
