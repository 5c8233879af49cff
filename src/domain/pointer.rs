//! JSON Pointer (RFC 6901) resolution over `serde_json::Value` trees.
//!
//! All document navigation in the mutation engine goes through this module.
//! A pointer is either the empty string (the whole document) or a sequence of
//! `/`-prefixed segments, with `~1` escaping `/` and `~0` escaping `~`.

use serde_json::Value;

use crate::domain::errors::{MutationError, MutationResult};

/// Escape a single reference token for embedding in a pointer.
///
/// `~` must be escaped before `/` so that the decoder's `~1`-then-`~0`
/// ordering round-trips.
pub fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Unescape a single reference token. Inverse of [`escape`].
pub fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Split a pointer into unescaped reference tokens.
///
/// The empty pointer yields an empty token list (the whole document).
/// A non-empty pointer must begin with `/`.
pub fn parse(pointer: &str) -> MutationResult<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(MutationError::InvalidDocument(format!(
            "JSON Pointer must start with '/': {pointer}"
        )));
    };
    Ok(rest.split('/').map(unescape).collect())
}

/// Parse an array index token. Rejects leading zeros (`01`) and signs,
/// per RFC 6901.
pub fn parse_index(token: &str, len: usize) -> Option<usize> {
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    if token.chars().any(|c| !c.is_ascii_digit()) {
        return None;
    }
    let index: usize = token.parse().ok()?;
    if index < len {
        Some(index)
    } else {
        None
    }
}

/// Resolve a pointer to a shared reference into the document.
///
/// Returns `None` when any segment does not exist or the pointer is
/// syntactically invalid.
pub fn resolve<'a>(document: &'a Value, pointer: &str) -> Option<&'a Value> {
    let tokens = parse(pointer).ok()?;
    let mut current = document;
    for token in &tokens {
        current = match current {
            Value::Object(map) => map.get(token)?,
            Value::Array(items) => {
                let index = parse_index(token, items.len())?;
                &items[index]
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Resolve a pointer to a mutable reference into the document.
pub fn resolve_mut<'a>(document: &'a mut Value, pointer: &str) -> Option<&'a mut Value> {
    let tokens = parse(pointer).ok()?;
    let mut current = document;
    for token in &tokens {
        current = match current {
            Value::Object(map) => map.get_mut(token)?,
            Value::Array(items) => {
                let index = parse_index(token, items.len())?;
                &mut items[index]
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Split a non-empty pointer into its parent pointer and final token.
///
/// `/a/b/c` splits into (`/a/b`, `c`); `/a` splits into (``, `a`).
/// The empty pointer has no parent and returns `None`.
pub fn split_parent(pointer: &str) -> Option<(String, String)> {
    if pointer.is_empty() || !pointer.starts_with('/') {
        return None;
    }
    let cut = pointer.rfind('/').unwrap_or(0);
    let parent = pointer[..cut].to_string();
    let leaf = unescape(&pointer[cut + 1..]);
    Some((parent, leaf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_round_trip() {
        let original = "a/b~c";
        let escaped = escape(original);
        assert_eq!(escaped, "a~1b~0c");
        assert_eq!(unescape(&escaped), original);
    }

    #[test]
    fn test_unescape_ordering() {
        // "~01" must decode to "~1", not "/"
        assert_eq!(unescape("~01"), "~1");
    }

    #[test]
    fn test_parse_empty_is_root() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_slash() {
        assert!(parse("info/title").is_err());
    }

    #[test]
    fn test_resolve_object_path() {
        let doc = json!({"info": {"title": "Petstore", "version": "1.0.0"}});
        assert_eq!(
            resolve(&doc, "/info/title"),
            Some(&Value::String("Petstore".to_string()))
        );
        assert_eq!(resolve(&doc, "/info/missing"), None);
    }

    #[test]
    fn test_resolve_array_index() {
        let doc = json!({"servers": [{"url": "a"}, {"url": "b"}]});
        assert_eq!(resolve(&doc, "/servers/1/url"), Some(&json!("b")));
        assert_eq!(resolve(&doc, "/servers/2"), None);
    }

    #[test]
    fn test_resolve_rejects_leading_zero_index() {
        let doc = json!([10, 20]);
        assert_eq!(resolve(&doc, "/01"), None);
        assert_eq!(resolve(&doc, "/1"), Some(&json!(20)));
    }

    #[test]
    fn test_resolve_escaped_segments() {
        let doc = json!({"paths": {"/pets": {"get": {}}}});
        assert!(resolve(&doc, "/paths/~1pets/get").is_some());
    }

    #[test]
    fn test_resolve_root() {
        let doc = json!({"a": 1});
        assert_eq!(resolve(&doc, ""), Some(&doc));
    }

    #[test]
    fn test_split_parent() {
        assert_eq!(
            split_parent("/a/b/c"),
            Some(("/a/b".to_string(), "c".to_string()))
        );
        assert_eq!(split_parent("/a"), Some((String::new(), "a".to_string())));
        assert_eq!(split_parent(""), None);
    }

    #[test]
    fn test_split_parent_unescapes_leaf() {
        let (parent, leaf) = split_parent("/paths/~1pets").unwrap();
        assert_eq!(parent, "/paths");
        assert_eq!(leaf, "/pets");
    }

    #[test]
    fn test_resolve_mut() {
        let mut doc = json!({"info": {"version": "1.0.0"}});
        *resolve_mut(&mut doc, "/info/version").unwrap() = json!("2.0.0");
        assert_eq!(doc, json!({"info": {"version": "2.0.0"}}));
    }
}
