//! Document filters and bulk update operators.
//!
//! Both work on the JSON document form of an entity, so a single
//! implementation serves every collection.

use serde_json::Value;

/// Predicate over a stored document.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// `doc[field] == value`.
    FieldEquals { field: String, value: Value },
    /// `doc[field]` is a string equal to `value` ignoring case.
    FieldEqualsIgnoreCase { field: String, value: String },
    /// `doc[field]` is a string containing `needle` ignoring case.
    FieldContainsText { field: String, needle: String },
    /// `doc[field]` is an array with an element equal to `value`.
    ArrayContains { field: String, value: Value },
    /// Every inner filter matches.
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn eq_ignore_case(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::FieldEqualsIgnoreCase {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains_text(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::FieldContainsText {
            field: field.into(),
            needle: needle.into(),
        }
    }

    pub fn array_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::ArrayContains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::FieldEquals { field, value } => doc.get(field) == Some(value),
            Filter::FieldEqualsIgnoreCase { field, value } => doc
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.to_lowercase() == value.to_lowercase()),
            Filter::FieldContainsText { field, needle } => doc
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
            Filter::ArrayContains { field, value } => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }
}

/// In-place modification applied to matching documents.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Overwrite `field` with `value`.
    Set { field: String, value: Value },
    /// Remove every element equal to `value` from the array at `field`.
    Pull { field: String, value: Value },
    /// Append `value` to the array at `field` unless already present.
    AddToSet { field: String, value: Value },
}

impl UpdateOp {
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        UpdateOp::Set {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn pull(field: impl Into<String>, value: impl Into<Value>) -> Self {
        UpdateOp::Pull {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn add_to_set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        UpdateOp::AddToSet {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Apply to `doc`, returning whether anything changed.
    ///
    /// Documents that are not JSON objects are left untouched.
    pub fn apply(&self, doc: &mut Value) -> bool {
        let Some(object) = doc.as_object_mut() else {
            return false;
        };
        match self {
            UpdateOp::Set { field, value } => {
                if object.get(field) == Some(value) {
                    return false;
                }
                object.insert(field.clone(), value.clone());
                true
            }
            UpdateOp::Pull { field, value } => match object.get_mut(field) {
                Some(Value::Array(items)) => {
                    let before = items.len();
                    items.retain(|item| item != value);
                    items.len() != before
                }
                _ => false,
            },
            UpdateOp::AddToSet { field, value } => {
                let slot = object
                    .entry(field.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                match slot {
                    Value::Array(items) if items.contains(value) => false,
                    Value::Array(items) => {
                        items.push(value.clone());
                        true
                    }
                    other => {
                        *other = Value::Array(vec![value.clone()]);
                        true
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matching() {
        let doc = json!({
            "_id": "b1",
            "genre": "Synthwave",
            "artist": "a1",
            "tags": ["x", "y"]
        });
        assert!(Filter::All.matches(&doc));
        assert!(Filter::eq("artist", "a1").matches(&doc));
        assert!(!Filter::eq("artist", "a2").matches(&doc));
        assert!(Filter::eq_ignore_case("genre", "SYNTHWAVE").matches(&doc));
        assert!(Filter::contains_text("genre", "WAVE").matches(&doc));
        assert!(Filter::array_contains("tags", "y").matches(&doc));
        assert!(!Filter::array_contains("genre", "y").matches(&doc));
        assert!(Filter::And(vec![Filter::eq("_id", "b1"), Filter::eq("artist", "a1")]).matches(&doc));
        assert!(!Filter::And(vec![Filter::eq("_id", "b1"), Filter::eq("artist", "zz")]).matches(&doc));
    }

    #[test]
    fn test_null_reference_matches_explicit_null() {
        let doc = json!({ "artist": null });
        assert!(Filter::eq("artist", Value::Null).matches(&doc));
        assert!(!Filter::eq("artist", "a1").matches(&doc));
    }

    #[test]
    fn test_set_reports_change_once() {
        let mut doc = json!({ "artist": "a1" });
        let op = UpdateOp::set("artist", Value::Null);
        assert!(op.apply(&mut doc));
        assert!(!op.apply(&mut doc));
        assert!(doc["artist"].is_null());
    }

    #[test]
    fn test_add_to_set_is_idempotent() {
        let mut doc = json!({ "favorite_albums": [] });
        let op = UpdateOp::add_to_set("favorite_albums", "b1");
        assert!(op.apply(&mut doc));
        assert!(!op.apply(&mut doc));
        assert_eq!(doc["favorite_albums"], json!(["b1"]));
    }

    #[test]
    fn test_add_to_set_creates_missing_array() {
        let mut doc = json!({});
        assert!(UpdateOp::add_to_set("favorite_albums", "b1").apply(&mut doc));
        assert_eq!(doc["favorite_albums"], json!(["b1"]));
    }

    #[test]
    fn test_pull_absent_is_noop() {
        let mut doc = json!({ "favorite_albums": ["b1", "b2"] });
        assert!(!UpdateOp::pull("favorite_albums", "b9").apply(&mut doc));
        assert!(UpdateOp::pull("favorite_albums", "b1").apply(&mut doc));
        assert_eq!(doc["favorite_albums"], json!(["b2"]));
        assert!(!UpdateOp::pull("missing", "b1").apply(&mut doc));
    }
}
