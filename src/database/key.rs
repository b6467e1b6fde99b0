//! Primary key parsing.
//!
//! Keys arrive as the raw path segment of the vendor API. Only a single
//! integer `id` is understood; a comma means a composite key.

use super::errors::{DatabaseError, DatabaseResult};

/// A parsed single-field primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryKey(i64);

impl PrimaryKey {
    /// Parse a key string, rejecting composite and non-integer keys
    pub fn parse(keys: &str) -> DatabaseResult<Self> {
        let trimmed = keys.trim();
        if trimmed.contains(',') {
            return Err(DatabaseError::UnsupportedKeyShape(keys.to_string()));
        }

        trimmed
            .parse::<i64>()
            .map(PrimaryKey)
            .map_err(|_| DatabaseError::InvalidKey(keys.to_string()))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer() {
        assert_eq!(PrimaryKey::parse("3").unwrap().value(), 3);
        assert_eq!(PrimaryKey::parse(" 42 ").unwrap().value(), 42);
        assert_eq!(PrimaryKey::parse("-1").unwrap().value(), -1);
    }

    #[test]
    fn test_parse_rejects_composite() {
        assert!(matches!(
            PrimaryKey::parse("1,2"),
            Err(DatabaseError::UnsupportedKeyShape(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_integer() {
        for keys in ["abc", "", "2.5", "1e3"] {
            assert!(
                matches!(PrimaryKey::parse(keys), Err(DatabaseError::InvalidKey(_))),
                "{keys}"
            );
        }
    }
}
