//! Ordered-document splicing.
//!
//! A [`Document`] is a `serde_json::Map` built with the `preserve_order`
//! feature, so it keeps insertion order alongside its key index. Both
//! splicing functions are pure: they copy `base` and never mutate inputs.

use serde_json::{Map, Value};

/// Ordered nested mapping used for every section of a structured document.
pub type Document = Map<String, Value>;

/// Return a copy of `base` with `(new_key, new_value)` placed immediately
/// after `after_key`.
///
/// An empty `base` yields the singleton `{new_key: new_value}`. A missing
/// anchor returns `base` unchanged and drops the new pair.
#[must_use]
pub fn insert_after(base: &Document, new_key: &str, new_value: Value, after_key: &str) -> Document {
    if base.is_empty() {
        let mut out = Document::new();
        out.insert(new_key.to_string(), new_value);
        return out;
    }

    let mut pending = Some(new_value);
    let mut out = Document::new();
    for (key, value) in base {
        out.insert(key.clone(), value.clone());
        if key == after_key
            && let Some(value) = pending.take()
        {
            out.insert(new_key.to_string(), value);
        }
    }
    out
}

/// Return a copy of `base` with every pair of `insertions`, in their own
/// order, spliced after `after_key`. A missing anchor returns `base` unchanged.
///
/// Unlike [`insert_after`], an empty `base` has no anchor and stays empty.
#[must_use]
pub fn insert_many_after(base: &Document, insertions: &Document, after_key: &str) -> Document {
    let mut out = Document::new();
    for (key, value) in base {
        out.insert(key.clone(), value.clone());
        if key == after_key {
            for (new_key, new_value) in insertions {
                out.insert(new_key.clone(), new_value.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn keys(doc: &Document) -> Vec<&str> {
        doc.keys().map(String::as_str).collect()
    }

    #[test]
    fn insert_after_on_empty_creates_singleton() {
        let out = insert_after(&Document::new(), "k", json!(1), "anything");
        assert_eq!(Value::Object(out), json!({"k": 1}));
    }

    #[test]
    fn insert_after_places_pair_after_anchor() {
        let base = doc(json!({"a": 1, "b": 2, "c": 3}));
        let out = insert_after(&base, "x", json!(99), "b");
        assert_eq!(keys(&out), vec!["a", "b", "x", "c"]);
        assert_eq!(out["x"], json!(99));
    }

    #[test]
    fn insert_after_missing_anchor_keeps_base() {
        let base = doc(json!({"a": 1, "b": 2}));
        let out = insert_after(&base, "x", json!(99), "zzz");
        assert_eq!(out, base);
        assert_eq!(keys(&out), vec!["a", "b"]);
    }

    #[test]
    fn insert_after_does_not_mutate_base() {
        let base = doc(json!({"a": 1}));
        let _ = insert_after(&base, "x", json!(2), "a");
        assert_eq!(keys(&base), vec!["a"]);
    }

    #[test]
    fn insert_many_after_splices_all_pairs_in_order() {
        let base = doc(json!({"a": 1, "b": 2, "c": 3}));
        let insertions = doc(json!({"x": 10, "y": 20}));
        let out = insert_many_after(&base, &insertions, "b");
        assert_eq!(keys(&out), vec!["a", "b", "x", "y", "c"]);
    }

    #[test]
    fn insert_many_after_missing_anchor_keeps_base() {
        let base = doc(json!({"a": 1, "b": 2}));
        let insertions = doc(json!({"x": 10}));
        let out = insert_many_after(&base, &insertions, "zzz");
        assert_eq!(keys(&out), vec!["a", "b"]);
    }

    #[test]
    fn insert_many_after_on_empty_stays_empty() {
        let insertions = doc(json!({"x": 10}));
        let out = insert_many_after(&Document::new(), &insertions, "anything");
        assert!(out.is_empty());
        assert_eq!(
            Value::Object(insert_after(&Document::new(), "x", json!(10), "anything")),
            json!({"x": 10})
        );
    }
}
