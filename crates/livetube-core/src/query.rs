//! Path query engine for response trees
//!
//! The upstream service returns deeply nested, loosely-typed JSON whose shape
//! is undocumented and changes without notice. Rather than modelling every
//! renderer as a concrete struct, callers navigate the raw tree with a small
//! pattern language:
//!
//! - `name` — descend into an object key (fails on absent or falsy values)
//! - `3` — descend into an array index
//! - `?` — fan out over every element of an array
//! - `name:value` — assert `name` string-equals `value` and keep the whole node
//!
//! Segments are joined with `/`. A miss anywhere yields [`Match::None`]; the
//! engine never errors for an absent path because partial absence is the
//! routine case in this domain, not the exceptional one.
//!
//! # Example
//!
//! ```
//! use livetube_core::query::{query, Match};
//! use serde_json::json;
//!
//! let tree = json!({"contents": [{"id": "a"}, {"id": "target", "x": 1}]});
//! let found = query(&tree, "contents/?/id:target").unwrap();
//! match found {
//!     Match::Many(nodes) => assert_eq!(nodes[0]["x"], 1),
//!     _ => panic!("expected a wildcard match"),
//! }
//! ```

use serde_json::Value;

use crate::error::{LivetubeError, Result};

/// Result of evaluating a pattern against a tree
///
/// Patterns without a wildcard yield `One` or `None`; patterns containing at
/// least one `?` yield a non-empty `Many` or `None`. An empty collection is
/// never returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Match<'a> {
    /// No node matched the pattern
    None,
    /// Single node matched (wildcard-free pattern)
    One(&'a Value),
    /// One node per successful wildcard branch, in array order
    Many(Vec<&'a Value>),
}

impl<'a> Match<'a> {
    /// True when nothing matched
    pub fn is_none(&self) -> bool {
        matches!(self, Match::None)
    }

    /// The matched node, or the first node of a wildcard match
    pub fn first(self) -> Option<&'a Value> {
        match self {
            Match::None => None,
            Match::One(node) => Some(node),
            Match::Many(nodes) => nodes.into_iter().next(),
        }
    }

    /// All matched nodes of a wildcard match
    pub fn many(self) -> Option<Vec<&'a Value>> {
        match self {
            Match::Many(nodes) => Some(nodes),
            _ => None,
        }
    }
}

/// Evaluates a `/`-separated pattern against a response tree
///
/// # Arguments
/// * `root` - The tree to search; must be an object or array
/// * `pattern` - Pattern string, e.g. `"contents/?/videoRenderer/videoId:abc"`
///
/// # Returns
/// A [`Match`] describing zero, one, or many matched nodes. The tree is
/// borrowed read-only; evaluating the same inputs twice yields the same
/// result.
///
/// # Errors
/// Returns `InvalidInput` only when `root` is a scalar. Traversal misses are
/// never errors.
pub fn query<'a>(root: &'a Value, pattern: &str) -> Result<Match<'a>> {
    if !root.is_object() && !root.is_array() {
        return Err(LivetubeError::InvalidInput(
            "query root must be an object or array".to_string(),
        ));
    }
    let segments: Vec<&str> = pattern.split('/').collect();
    Ok(eval(root, &segments))
}

fn eval<'a>(root: &'a Value, segments: &[&str]) -> Match<'a> {
    let mut cursor = root;

    for (level, segment) in segments.iter().enumerate() {
        if *segment == "?" {
            let Some(items) = cursor.as_array() else {
                return Match::None;
            };
            let tail = &segments[level + 1..];
            let mut found: Vec<&'a Value> = Vec::new();
            for item in items {
                match eval(item, tail) {
                    Match::None => {}
                    Match::One(node) => found.push(node),
                    // A nested wildcard resolved to a list: each branch is
                    // expected to contain exactly one real match, so keep the
                    // first element only.
                    Match::Many(nodes) => {
                        if let Some(&node) = nodes.first() {
                            found.push(node);
                        }
                    }
                }
            }
            return if found.is_empty() {
                Match::None
            } else {
                Match::Many(found)
            };
        } else if is_index(segment) {
            let Some(items) = cursor.as_array() else {
                return Match::None;
            };
            match segment.parse::<usize>().ok().and_then(|i| items.get(i)) {
                Some(node) => cursor = node,
                None => return Match::None,
            }
        } else if let Some((key, want)) = segment.split_once(':') {
            // Equality guard: assert and keep the cursor on the whole node.
            let Some(map) = cursor.as_object() else {
                return Match::None;
            };
            match map.get(key) {
                Some(field) if string_eq(field, want) => {}
                _ => return Match::None,
            }
        } else {
            let Some(map) = cursor.as_object() else {
                return Match::None;
            };
            match map.get(*segment) {
                Some(node) if is_truthy(node) => cursor = node,
                _ => return Match::None,
            }
        }
    }

    if is_truthy(cursor) {
        Match::One(cursor)
    } else {
        Match::None
    }
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Truthiness of a node, matching the domain convention that "empty" and
/// "absent" are equivalent non-matches
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn string_eq(field: &Value, want: &str) -> bool {
    match field {
        Value::String(s) => s == want,
        Value::Number(n) => n.to_string() == want,
        Value::Bool(b) => {
            if *b {
                want == "true"
            } else {
                want == "false"
            }
        }
        _ => false,
    }
}

/// Depth-first search for the first occurrence of an object key
///
/// Used where a renderer's nesting varies too much for a fixed pattern, e.g.
/// locating `subscriberCountText` somewhere under a channel header.
pub fn search_key<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    match root {
        Value::Object(map) => {
            if let Some(node) = map.get(key) {
                return Some(node);
            }
            map.values().find_map(|node| search_key(node, key))
        }
        Value::Array(items) => items.iter().find_map(|node| search_key(node, key)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_literal_key_descent() {
        let tree = json!({"a": {"b": {"c": 42}}});
        let found = query(&tree, "a/b/c").unwrap();
        assert_eq!(found, Match::One(&json!(42)));
    }

    #[test]
    fn test_literal_key_missing() {
        let tree = json!({"a": {"b": 1}});
        assert!(query(&tree, "a/nope").unwrap().is_none());
    }

    #[test]
    fn test_falsy_value_fails_like_absent() {
        // Empty string, empty list, zero, null and false all fail the descent
        let tree = json!({
            "s": "", "l": [], "n": 0, "z": null, "f": false
        });
        for pattern in ["s", "l", "n", "z", "f"] {
            assert!(
                query(&tree, pattern).unwrap().is_none(),
                "expected no match for {pattern}"
            );
        }
    }

    #[test]
    fn test_numeric_index() {
        let tree = json!({"items": ["x", "y", "z"]});
        let found = query(&tree, "items/1").unwrap();
        assert_eq!(found, Match::One(&json!("y")));
    }

    #[test]
    fn test_numeric_index_out_of_range() {
        let tree = json!({"items": ["x"]});
        assert!(query(&tree, "items/5").unwrap().is_none());
    }

    #[test]
    fn test_numeric_index_on_object_fails() {
        let tree = json!({"items": {"0": "x"}});
        assert!(query(&tree, "items/0").unwrap().is_none());
    }

    #[test]
    fn test_guard_returns_whole_node() {
        let tree = json!({"kind": "X", "val": 5});
        let found = query(&tree, "kind:X").unwrap();
        assert_eq!(found, Match::One(&tree));
    }

    #[test]
    fn test_guard_mismatch() {
        let tree = json!({"kind": "Y"});
        assert!(query(&tree, "kind:X").unwrap().is_none());
    }

    #[test]
    fn test_guard_missing_key() {
        let tree = json!({"other": "X"});
        assert!(query(&tree, "kind:X").unwrap().is_none());
    }

    #[test]
    fn test_guard_value_containing_colon() {
        // Only the first colon separates key from value
        let tree = json!({"style": "CARD_ITEM_TEXT_STYLE_TITLE:2"});
        let found = query(&tree, "style:CARD_ITEM_TEXT_STYLE_TITLE:2").unwrap();
        assert_eq!(found, Match::One(&tree));
    }

    #[test]
    fn test_wildcard_collects_matches() {
        let tree = json!({
            "contents": [
                {"id": "a"},
                {"id": "target", "x": 1},
                {"id": "target", "x": 2}
            ]
        });
        let found = query(&tree, "contents/?/id:target").unwrap();
        let nodes = found.many().expect("expected wildcard result");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0]["x"], 1);
        assert_eq!(nodes[1]["x"], 2);
    }

    #[test]
    fn test_wildcard_example_from_docs() {
        let tree = json!({"contents": [{"id": "a"}, {"id": "target", "x": 1}]});
        let found = query(&tree, "contents/?/id:target").unwrap();
        assert_eq!(
            found.many().unwrap(),
            vec![&json!({"id": "target", "x": 1})]
        );
    }

    #[test]
    fn test_wildcard_all_miss_is_none_not_empty_list() {
        let tree = json!({"contents": [{"id": "a"}, {"id": "b"}]});
        let found = query(&tree, "contents/?/id:target").unwrap();
        assert!(found.is_none());
        assert_eq!(found.many(), None);
    }

    #[test]
    fn test_wildcard_on_non_array_fails() {
        let tree = json!({"contents": {"id": "a"}});
        assert!(query(&tree, "contents/?/id").unwrap().is_none());
    }

    #[test]
    fn test_nested_wildcard_takes_first_of_inner_list() {
        let tree = json!({
            "tabs": [
                {"rows": [{"name": "r0"}, {"name": "r1"}]},
                {"rows": [{"name": "r2"}]},
                {"other": true}
            ]
        });
        let found = query(&tree, "tabs/?/rows/?/name").unwrap();
        let nodes = found.many().expect("expected wildcard result");
        // One entry per outer branch that matched, each the first inner hit
        assert_eq!(nodes, vec![&json!("r0"), &json!("r2")]);
    }

    #[test]
    fn test_wildcard_free_pattern_never_returns_many() {
        let tree = json!({"a": [{"b": 1}, {"b": 2}]});
        match query(&tree, "a/0/b").unwrap() {
            Match::One(_) => {}
            other => panic!("expected One, got {other:?}"),
        }
    }

    #[test]
    fn test_mixed_index_and_guard() {
        let tree = json!({
            "sections": [
                {"header": {"title": "first"}},
                {"header": {"title": "second"}}
            ]
        });
        let found = query(&tree, "sections/1/header/title:second").unwrap();
        assert_eq!(found, Match::One(&json!({"title": "second"})));
    }

    #[test]
    fn test_scalar_root_is_an_error() {
        let tree = json!("just a string");
        assert!(matches!(
            query(&tree, "a/b"),
            Err(LivetubeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_array_root_is_accepted() {
        let tree = json!([{"playerResponse": {"ok": true}}, {"response": {"ok": true}}]);
        let found = query(&tree, "?/playerResponse").unwrap();
        assert_eq!(found.many().unwrap().len(), 1);
    }

    #[test]
    fn test_idempotence() {
        let tree = json!({"contents": [{"id": "target", "x": 1}]});
        let first = query(&tree, "contents/?/id:target").unwrap();
        let second = query(&tree, "contents/?/id:target").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_search_key_finds_nested() {
        let tree = json!({
            "header": {"renderer": {"subscriberCountText": {"simpleText": "1.2K"}}}
        });
        let found = search_key(&tree, "subscriberCountText").unwrap();
        assert_eq!(found["simpleText"], "1.2K");
    }

    #[test]
    fn test_search_key_through_arrays() {
        let tree = json!({"rows": [{"a": 1}, {"b": {"target": "hit"}}]});
        assert_eq!(search_key(&tree, "target"), Some(&json!("hit")));
    }

    #[test]
    fn test_search_key_missing() {
        let tree = json!({"a": [1, 2, 3]});
        assert_eq!(search_key(&tree, "nope"), None);
    }

    proptest! {
        // Any wildcard-free pattern over any tree yields One or None, never Many
        #[test]
        fn prop_no_wildcard_never_many(
            keys in proptest::collection::vec("[a-z]{1,4}", 1..4)
        ) {
            let tree = json!({"a": {"b": {"c": [1, 2, 3]}}});
            let pattern = keys.join("/");
            if let Ok(result) = query(&tree, &pattern) {
                prop_assert!(!matches!(result, Match::Many(_)));
            }
        }

        // Evaluation is a pure function of its inputs
        #[test]
        fn prop_idempotent(idx in 0usize..6) {
            let tree = json!({"items": [{"k": "v"}, {"k": "w"}]});
            let pattern = format!("items/{idx}/k");
            let first = query(&tree, &pattern).unwrap();
            let second = query(&tree, &pattern).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
