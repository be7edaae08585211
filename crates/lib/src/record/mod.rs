//! Records as seen through the record-store boundary.
//!
//! A [`Record`] is an opaque document owned by the store. The ordering engine
//! only ever reads and writes a handful of top-level fields on it: the order
//! field, the relation or bucket field that places it in a domain, and the
//! creation timestamp used as a tiebreaker.

mod id;

pub use id::RecordId;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level field updates. A `null` value removes the field.
pub type Patch = Map<String, Value>;

/// A single stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Store-wide identifier, unique within `collection`
    pub id: RecordId,
    /// Collection slug the record lives in
    pub collection: String,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: u64,
    /// Document body
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Record {
    /// Creates a record from its parts.
    pub fn new(
        collection: impl Into<String>,
        id: RecordId,
        created_at: u64,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            collection: collection.into(),
            created_at,
            data,
        }
    }

    /// Returns a top-level field of the document.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Returns a top-level field if it is a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }

    /// Applies a patch in place.
    pub fn apply_patch(&mut self, patch: &Patch) {
        for (field, value) in patch {
            if value.is_null() {
                self.data.remove(field);
            } else {
                self.data.insert(field.clone(), value.clone());
            }
        }
    }
}

/// Predicate over records, evaluated by backends that cannot push it down.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every record in the collection
    All,
    /// Top-level field equals the value
    Eq { field: String, value: Value },
    /// Top-level field is absent or null
    Missing { field: String },
    /// Record id is one of the listed ids
    Ids(Vec<RecordId>),
    /// All nested filters hold
    And(Vec<Filter>),
}

impl Filter {
    /// Shorthand for [`Filter::Eq`].
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Shorthand for [`Filter::Missing`].
    pub fn missing(field: impl Into<String>) -> Self {
        Filter::Missing {
            field: field.into(),
        }
    }

    /// Evaluates the filter against a record.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => record.field(field) == Some(value),
            Filter::Missing { field } => record.field(field).is_none_or(Value::is_null),
            Filter::Ids(ids) => ids.contains(&record.id),
            Filter::And(filters) => filters.iter().all(|f| f.matches(record)),
        }
    }
}
