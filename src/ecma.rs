//! Best-effort translation of ECMA 262 regular expressions into the syntax
//! accepted by `fancy-regex`.
//!
//! JSON Schema `pattern` and `patternProperties` use ECMA 262 semantics.
//! `fancy-regex` already covers look-arounds and backreferences; what is
//! left differs mostly in the shorthand classes, which are Unicode-aware in
//! Rust but ASCII in ECMA 262, and in `\cX` control escapes, which Rust does
//! not know at all. The translator rewrites those and leaves everything else
//! untouched. Patterns are otherwise not validated here; `Regex::new`
//! decides what ultimately compiles.
use std::borrow::Cow;

const DIGIT: &str = "[0-9]";
const NOT_DIGIT: &str = "[^0-9]";
const WORD: &str = "[A-Za-z0-9_]";
const NOT_WORD: &str = "[^A-Za-z0-9_]";
const SPACE: &str = "[ \\t\\n\\r\\x0b\\x0c\\u{00a0}\\u{feff}\\u{1680}\\u{2000}-\\u{200a}\\u{2028}\\u{2029}\\u{202f}\\u{205f}\\u{3000}]";
const SPACE_SET: &str = " \\t\\n\\r\\x0b\\x0c\\u{00a0}\\u{feff}\\u{1680}\\u{2000}-\\u{200a}\\u{2028}\\u{2029}\\u{202f}\\u{205f}\\u{3000}";

/// Rewrite an ECMA 262 pattern for `fancy_regex::Regex::new`.
///
/// Fails when the pattern cannot be represented, e.g. a dangling `\c`.
pub(crate) fn to_rust_regex(pattern: &str) -> Result<Cow<'_, str>, ()> {
    if !pattern
        .bytes()
        .any(|byte| byte == b'\\')
    {
        return Ok(Cow::Borrowed(pattern));
    }
    let mut output = String::with_capacity(pattern.len() + 8);
    let mut in_class = false;
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '[' if !in_class => {
                in_class = true;
                output.push('[');
                // A leading `^` or `]` is part of the class header.
                if chars.peek() == Some(&'^') {
                    chars.next();
                    output.push('^');
                }
            }
            ']' if in_class => {
                in_class = false;
                output.push(']');
            }
            '\\' => {
                let Some(escaped) = chars.next() else {
                    return Err(());
                };
                match escaped {
                    'd' => output.push_str(if in_class { "0-9" } else { DIGIT }),
                    'D' => {
                        if in_class {
                            // `[^0-9]` cannot be spliced into a class.
                            output.push_str("\\D");
                        } else {
                            output.push_str(NOT_DIGIT);
                        }
                    }
                    'w' => output.push_str(if in_class { "A-Za-z0-9_" } else { WORD }),
                    'W' => {
                        if in_class {
                            output.push_str("\\W");
                        } else {
                            output.push_str(NOT_WORD);
                        }
                    }
                    's' => output.push_str(if in_class { SPACE_SET } else { SPACE }),
                    'S' => {
                        if in_class {
                            output.push_str("\\S");
                        } else {
                            output.push_str(&format!("[^{SPACE_SET}]"));
                        }
                    }
                    'c' => {
                        // `\cX` is the control character X % 32.
                        match chars.next() {
                            Some(letter) if letter.is_ascii_alphabetic() => {
                                let control = (letter as u8 % 32) as char;
                                output.push_str(&format!("\\x{:02x}", control as u8));
                            }
                            _ => return Err(()),
                        }
                    }
                    other => {
                        output.push('\\');
                        output.push(other);
                    }
                }
            }
            other => output.push(other),
        }
    }
    Ok(Cow::Owned(output))
}
