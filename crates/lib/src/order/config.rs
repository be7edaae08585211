//! Per-collection ordering configuration.

use serde::{Deserialize, Serialize};

use crate::{constants::DEFAULT_ORDER_FIELD, key::DEFAULT_KEY_LENGTH, scope::ScopeConfig};

fn default_order_field() -> String {
    DEFAULT_ORDER_FIELD.to_string()
}

fn default_key_length() -> usize {
    DEFAULT_KEY_LENGTH
}

/// How one collection is ordered.
///
/// ```
/// use orderable::order::CollectionConfig;
///
/// let config = CollectionConfig::new("items").joined("list", "lists");
/// assert_eq!(config.order_field, "_order");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Collection slug
    pub slug: String,
    /// Field holding the order key; unused by non-unique collections
    #[serde(default = "default_order_field")]
    pub order_field: String,
    #[serde(default)]
    pub scope: ScopeConfig,
    /// Maximum digits per order key
    #[serde(default = "default_key_length")]
    pub key_length: usize,
}

impl CollectionConfig {
    /// A globally ordered collection with default settings.
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            order_field: default_order_field(),
            scope: ScopeConfig::Global,
            key_length: default_key_length(),
        }
    }

    /// Groups the collection by a relation field.
    pub fn joined(
        mut self,
        relation_field: impl Into<String>,
        related_collection: impl Into<String>,
    ) -> Self {
        self.scope = ScopeConfig::Join {
            relation_field: relation_field.into(),
            related_collection: related_collection.into(),
        };
        self
    }

    /// Orders the collection by integer buckets.
    pub fn non_unique(mut self, bucket_field: impl Into<String>) -> Self {
        self.scope = ScopeConfig::NonUnique {
            bucket_field: bucket_field.into(),
        };
        self
    }

    pub fn with_order_field(mut self, order_field: impl Into<String>) -> Self {
        self.order_field = order_field.into();
        self
    }

    pub fn with_key_length(mut self, key_length: usize) -> Self {
        self.key_length = key_length;
        self
    }
}
