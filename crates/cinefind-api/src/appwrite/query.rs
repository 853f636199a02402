//! Appwrite query strings.
//!
//! Appwrite 1.5+ accepts each `queries[]` parameter as a JSON object
//! `{"method": ..., "attribute": ..., "values": [...]}`.

use serde_json::{Value, json};

/// One document list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Attribute equals the given string.
    Equal {
        /// Attribute name.
        attribute: String,
        /// Value to match exactly.
        value: String,
    },
    /// Sort by attribute, descending.
    OrderDesc(String),
    /// Maximum number of documents returned.
    Limit(u32),
}

impl Query {
    /// `attribute == value`.
    pub fn equal(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equal {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Serializes into the JSON string Appwrite expects.
    #[must_use]
    pub fn to_json(&self) -> String {
        let value: Value = match self {
            Self::Equal { attribute, value } => json!({
                "method": "equal",
                "attribute": attribute,
                "values": [value],
            }),
            Self::OrderDesc(attribute) => json!({
                "method": "orderDesc",
                "attribute": attribute,
            }),
            Self::Limit(limit) => json!({
                "method": "limit",
                "values": [limit],
            }),
        };
        value.to_string()
    }
}
