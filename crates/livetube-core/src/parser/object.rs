//! Brace-matching object parser
//!
//! Watch pages embed large JavaScript object literals (`ytInitialData = {...}`)
//! in inline scripts. Rather than regex-capturing the whole object (fragile for
//! nested braces), this module scans from a known start offset, tracking
//! bracket/brace/quote context to find the exact end of the literal, then
//! parses the enclosed substring as JSON. A relaxed second pass tolerates the
//! single-quoted strings and trailing commas the page sometimes emits.

use regex::Regex;
use serde_json::Value;

use crate::error::{LivetubeError, Result};

/// Parses the object literal starting at `start`
///
/// # Arguments
/// * `text` - Raw script or page text
/// * `start` - Byte offset of the opening `{`
///
/// # Returns
/// The parsed value
///
/// # Errors
/// Returns `ParseError` when `text[start]` is not `{`, the literal is
/// unterminated, or both the strict and relaxed parses fail
pub fn parse_object_at(text: &str, start: usize) -> Result<Value> {
    if text.as_bytes().get(start) != Some(&b'{') {
        return Err(LivetubeError::ParseError(
            "object start offset does not point at '{'".to_string(),
        ));
    }

    let end = object_end(text.as_bytes(), start)?;
    let raw = &text[start..end];

    match serde_json::from_str(raw) {
        Ok(value) => Ok(value),
        Err(_) => parse_relaxed(raw),
    }
}

/// Parses the first object literal following a regex anchor
///
/// Tries every anchor occurrence in document order; the object is expected to
/// begin right after the matched text.
///
/// # Errors
/// Returns `RegexMatchError` when the anchor never matches, `ParseError` when
/// no occurrence is followed by a parseable object
pub fn parse_object_after(text: &str, anchor: &Regex) -> Result<Value> {
    let mut matched = false;
    for m in anchor.find_iter(text) {
        matched = true;
        if let Ok(value) = parse_object_at(text, m.end()) {
            return Ok(value);
        }
    }

    if matched {
        Err(LivetubeError::ParseError(format!(
            "no parseable object after anchor {}",
            anchor.as_str()
        )))
    } else {
        Err(LivetubeError::regex_match("parse_object_after", anchor.as_str()))
    }
}

/// Finds the byte offset one past the closing `}` of the literal at `start`
///
/// Maintains a stack of open contexts. Inside a double-quoted string, `\`
/// consumes the following byte without re-entering escape processing. Multibyte
/// characters are skipped byte-wise: no UTF-8 continuation byte can collide
/// with the ASCII structural characters tested here.
fn object_end(bytes: &[u8], start: usize) -> Result<usize> {
    let mut stack: Vec<u8> = vec![b'{'];
    let mut i = start + 1;

    while let Some(&context) = stack.last() {
        let Some(&current) = bytes.get(i) else {
            return Err(LivetubeError::ParseError(
                "unterminated object literal".to_string(),
            ));
        };

        let closer = match context {
            b'{' => b'}',
            b'[' => b']',
            _ => b'"',
        };

        if current == closer {
            stack.pop();
            i += 1;
            continue;
        }

        if context == b'"' {
            if current == b'\\' {
                i += 2;
                continue;
            }
        } else if matches!(current, b'{' | b'[' | b'"') {
            stack.push(current);
        }

        i += 1;
    }

    Ok(i)
}

/// Relaxed parse: rewrite single-quoted strings and trailing commas into
/// strict JSON, then parse again
fn parse_relaxed(raw: &str) -> Result<Value> {
    let normalized = normalize_relaxed(raw);
    serde_json::from_str(&normalized)
        .map_err(|e| LivetubeError::ParseError(format!("could not parse object: {e}")))
}

fn normalize_relaxed(raw: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Plain,
        Double,
        Single,
    }

    let mut out = String::with_capacity(raw.len());
    let mut state = State::Plain;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match state {
            State::Plain => match c {
                '"' => {
                    state = State::Double;
                    out.push(c);
                }
                '\'' => {
                    state = State::Single;
                    out.push('"');
                }
                ',' => {
                    // Drop the comma when the next non-whitespace closes a
                    // container (trailing-comma form)
                    let mut ahead = chars.clone();
                    let next = loop {
                        match ahead.next() {
                            Some(w) if w.is_whitespace() => continue,
                            other => break other,
                        }
                    };
                    if !matches!(next, Some('}') | Some(']')) {
                        out.push(c);
                    }
                }
                _ => out.push(c),
            },
            State::Double => {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == '"' {
                    state = State::Plain;
                }
            }
            State::Single => {
                if c == '\\' {
                    match chars.next() {
                        // \' has no meaning in JSON strings
                        Some('\'') => out.push('\''),
                        Some(escaped) => {
                            out.push('\\');
                            out.push(escaped);
                        }
                        None => out.push('\\'),
                    }
                } else if c == '\'' {
                    out.push('"');
                    state = State::Plain;
                } else if c == '"' {
                    out.push_str("\\\"");
                } else {
                    out.push(c);
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_parse_simple_object() {
        let text = r#"var data = {"a": 1};"#;
        let start = text.find('{').unwrap();
        let value = parse_object_at(text, start).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_parse_recovers_exact_object_with_trailing_text() {
        let text = r#"prefix {"a": {"b": [1,2,3]}} suffix {"other": true}"#;
        let start = text.find('{').unwrap();
        let value = parse_object_at(text, start).unwrap();
        assert_eq!(value, json!({"a": {"b": [1, 2, 3]}}));
    }

    #[test]
    fn test_parse_nested_braces_in_strings() {
        let text = r#"{"text": "closing } inside", "next": 1} tail"#;
        let value = parse_object_at(text, 0).unwrap();
        assert_eq!(value["next"], 1);
        assert_eq!(value["text"], "closing } inside");
    }

    #[test]
    fn test_parse_escaped_quote_in_string() {
        let text = r#"{"text": "an \" escaped quote", "n": 2};"#;
        let value = parse_object_at(text, 0).unwrap();
        assert_eq!(value["n"], 2);
    }

    #[test]
    fn test_wrong_start_offset() {
        let text = r#"abc {"a": 1}"#;
        assert!(matches!(
            parse_object_at(text, 0),
            Err(LivetubeError::ParseError(_))
        ));
    }

    #[test]
    fn test_unterminated_object() {
        let text = r#"{"a": {"b": 1}"#;
        assert!(matches!(
            parse_object_at(text, 0),
            Err(LivetubeError::ParseError(_))
        ));
    }

    #[test]
    fn test_relaxed_single_quotes() {
        let text = r#"{'key': 'value', "mixed": 'x'}"#;
        let value = parse_object_at(text, 0).unwrap();
        assert_eq!(value, json!({"key": "value", "mixed": "x"}));
    }

    #[test]
    fn test_relaxed_trailing_comma() {
        let text = r#"{"a": [1, 2,], "b": {"c": 3,},}"#;
        let value = parse_object_at(text, 0).unwrap();
        assert_eq!(value, json!({"a": [1, 2], "b": {"c": 3}}));
    }

    #[test]
    fn test_relaxed_comma_inside_string_untouched() {
        let text = r#"{"a": "1,2,]", "b": 2}"#;
        let value = parse_object_at(text, 0).unwrap();
        assert_eq!(value["a"], "1,2,]");
    }

    #[test]
    fn test_parse_object_after_anchor() {
        let text = r#"window["ytInitialData"] = {"contents": {"ok": true}};"#;
        let anchor = Regex::new(r#"window\[['"]ytInitialData['"]]\s*=\s*"#).unwrap();
        let value = parse_object_after(text, &anchor).unwrap();
        assert_eq!(value["contents"]["ok"], true);
    }

    #[test]
    fn test_parse_object_after_skips_non_object_occurrences() {
        // First occurrence is the string-key call form, second is the object
        let text = r#"ytcfg.set("KEY", 1); ytcfg.set({"INNERTUBE_API_KEY": "k"});"#;
        let anchor = Regex::new(r"ytcfg\.set\(").unwrap();
        let value = parse_object_after(text, &anchor).unwrap();
        assert_eq!(value["INNERTUBE_API_KEY"], "k");
    }

    #[test]
    fn test_parse_object_after_no_anchor() {
        let anchor = Regex::new(r"ytInitialData\s*=\s*").unwrap();
        assert!(matches!(
            parse_object_after("nothing here", &anchor),
            Err(LivetubeError::RegexMatchError { .. })
        ));
    }

    #[test]
    fn test_multibyte_content() {
        let text = r#"{"title": "直播中 🔴", "n": 1} rest"#;
        let value = parse_object_at(text, 0).unwrap();
        assert_eq!(value["title"], "直播中 🔴");
    }

    proptest! {
        // Round-trip: any JSON object embedded in surrounding text is
        // recovered exactly, with no leading or trailing characters
        #[test]
        fn prop_round_trip_embedded_object(
            n in 0i64..1000,
            s in "[a-zA-Z0-9 ]{0,12}",
            prefix in "[a-z =;]{0,10}",
            suffix in "[a-z =;{}]{0,10}",
        ) {
            let object = json!({"a": {"b": [1, 2, 3]}, "n": n, "s": s});
            let embedded = format!("{prefix}{object}{suffix}");
            let start = prefix.len();
            let value = parse_object_at(&embedded, start).unwrap();
            prop_assert_eq!(value, object);
        }
    }
}
