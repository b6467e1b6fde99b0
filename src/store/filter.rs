//! # Filters and Projections
//!
//! The only query shapes the translator ever hands to a store: "everything"
//! or "the document whose `id` equals N", optionally narrowed to a list of
//! fields.

use serde_json::{Map, Value};

/// Logical primary key carried by every document
pub const PRIMARY_KEY: &str = "id";

/// Identifier the store assigns on its own
pub const INTERNAL_ID: &str = "_id";

/// Document filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Match every document in the collection
    All,
    /// Match documents whose `id` field equals the value
    IdEquals(i64),
}

impl Filter {
    /// Check whether a document satisfies this filter
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::IdEquals(id) => match doc.get(PRIMARY_KEY) {
                Some(Value::Number(n)) => match n.as_i64() {
                    Some(v) => v == *id,
                    None => n.as_f64() == Some(*id as f64),
                },
                _ => false,
            },
        }
    }
}

/// Caller-requested subset of fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    /// Parse a comma-separated field list.
    ///
    /// Blank entries are skipped; `None` when nothing is left, which callers
    /// treat as "all fields".
    pub fn parse(spec: &str) -> Option<Self> {
        let mut fields: Vec<String> = Vec::new();
        for field in spec.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            if !fields.iter().any(|f| f == field) {
                fields.push(field.to_string());
            }
        }

        if fields.is_empty() {
            None
        } else {
            Some(Self { fields })
        }
    }

    /// Requested field names, in request order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Whether the caller asked for the store-internal identifier
    pub fn includes_internal_id(&self) -> bool {
        self.fields.iter().any(|f| f == INTERNAL_ID)
    }

    /// Keep only the requested fields of a document
    pub fn apply(&self, doc: Value) -> Value {
        match doc {
            Value::Object(mut obj) => {
                let mut projected = Map::new();
                for field in &self.fields {
                    if let Some(value) = obj.remove(field) {
                        projected.insert(field.clone(), value);
                    }
                }
                Value::Object(projected)
            }
            other => other,
        }
    }
}

/// Drop the store-internal identifier from a document
pub fn strip_internal_id(doc: Value) -> Value {
    match doc {
        Value::Object(mut obj) => {
            obj.remove(INTERNAL_ID);
            Value::Object(obj)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_filter_matches_integer_and_float_ids() {
        let filter = Filter::IdEquals(3);
        assert!(filter.matches(&json!({"id": 3, "name": "x"})));
        assert!(filter.matches(&json!({"id": 3.0})));
        assert!(!filter.matches(&json!({"id": 4})));
        assert!(!filter.matches(&json!({"id": "3"})));
        assert!(!filter.matches(&json!({"name": "no id"})));
        assert!(Filter::All.matches(&json!({})));
    }

    #[test]
    fn test_projection_parse() {
        let projection = Projection::parse(" Name, email,,Name ").unwrap();
        assert_eq!(projection.fields(), &["Name".to_string(), "email".to_string()]);
        assert!(Projection::parse("").is_none());
        assert!(Projection::parse(" , ").is_none());
    }

    #[test]
    fn test_projection_apply_keeps_only_requested_fields() {
        let projection = Projection::parse("a,b").unwrap();
        let doc = json!({"_id": "x", "a": 1, "b": 2, "c": 3});
        assert_eq!(projection.apply(doc), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_projection_can_request_internal_id() {
        let projection = Projection::parse("_id,a").unwrap();
        assert!(projection.includes_internal_id());
        let doc = json!({"_id": "x", "a": 1, "b": 2});
        assert_eq!(projection.apply(doc), json!({"_id": "x", "a": 1}));
    }

    #[test]
    fn test_strip_internal_id() {
        assert_eq!(strip_internal_id(json!({"_id": "x", "id": 1})), json!({"id": 1}));
    }
}
