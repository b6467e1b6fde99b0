//! Per-call options of the vendor API.

use serde::Deserialize;

use crate::store::{Projection, PRIMARY_KEY};

use super::errors::{DatabaseError, DatabaseResult};

/// Options accepted by `getAll`, `get` and `merge`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    /// Comma-separated projection
    #[serde(default)]
    pub fields: Option<String>,

    /// Comma-separated primary key names; only `id` is understood
    #[serde(default)]
    pub primary_keys: Option<String>,
}

impl QueryOptions {
    /// Options with a projection
    pub fn with_fields(fields: impl Into<String>) -> Self {
        Self {
            fields: Some(fields.into()),
            ..Default::default()
        }
    }

    /// Parsed projection, `None` for all fields
    pub fn projection(&self) -> Option<Projection> {
        self.fields.as_deref().and_then(Projection::parse)
    }

    /// Reject any primary key declaration other than `id`
    pub fn check_primary_keys(&self) -> DatabaseResult<()> {
        match self.primary_keys.as_deref().map(str::trim) {
            None | Some("") | Some(PRIMARY_KEY) => Ok(()),
            Some(other) => Err(DatabaseError::Validation(format!(
                "only the primary key `{}` is supported, got '{}'",
                PRIMARY_KEY, other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_from_fields() {
        assert!(QueryOptions::default().projection().is_none());
        assert!(QueryOptions::with_fields("").projection().is_none());
        let projection = QueryOptions::with_fields("Name,email").projection().unwrap();
        assert_eq!(projection.fields().len(), 2);
    }

    #[test]
    fn test_primary_keys_check() {
        assert!(QueryOptions::default().check_primary_keys().is_ok());

        let options = QueryOptions {
            primary_keys: Some("id".to_string()),
            ..Default::default()
        };
        assert!(options.check_primary_keys().is_ok());

        let options = QueryOptions {
            primary_keys: Some("id,code".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            options.check_primary_keys(),
            Err(DatabaseError::Validation(_))
        ));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let options: QueryOptions =
            serde_json::from_str(r#"{"fields": "a,b", "primaryKeys": "id"}"#).unwrap();
        assert_eq!(options.fields.as_deref(), Some("a,b"));
        assert_eq!(options.primary_keys.as_deref(), Some("id"));
    }
}
