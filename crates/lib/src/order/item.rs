//! Values exchanged with callers of the ordering service.

use serde::{Deserialize, Serialize};

use crate::{
    key::OrderKey,
    record::{Record, RecordId},
    scope::{GroupKey, OrderingDomain},
};

/// The value a record is sorted by inside its domain.
///
/// Variants compare in declaration order, so records without a value sort
/// after every keyed or bucketed record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OrderValue {
    /// Unique fractional key
    Key(OrderKey),
    /// Shared integer bucket
    Bucket(i64),
    /// No usable value stored yet
    Missing,
}

impl OrderValue {
    pub fn key(&self) -> Option<&OrderKey> {
        match self {
            OrderValue::Key(key) => Some(key),
            _ => None,
        }
    }

    pub fn bucket(&self) -> Option<i64> {
        match self {
            OrderValue::Bucket(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, OrderValue::Missing)
    }
}

impl std::fmt::Display for OrderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderValue::Key(key) => write!(f, "{key}"),
            OrderValue::Bucket(n) => write!(f, "{n}"),
            OrderValue::Missing => write!(f, "-"),
        }
    }
}

/// A record together with the value it is ordered by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderedItem {
    /// Group the record belongs to, if its grouping field is readable
    pub group: Option<GroupKey>,
    pub value: OrderValue,
    pub record: Record,
}

impl OrderedItem {
    pub fn id(&self) -> &RecordId {
        &self.record.id
    }

    /// Total order inside a domain: value, then creation time, then id.
    pub(crate) fn sort_key(&self) -> (&OrderValue, u64, &RecordId) {
        (&self.value, self.record.created_at, &self.record.id)
    }
}

/// Where an item goes inside its domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "at", content = "anchor", rename_all = "snake_case")]
pub enum Placement {
    /// Before every other item
    Start,
    /// After every other item
    End,
    /// Immediately after the anchor
    After(RecordId),
    /// Immediately before the anchor
    Before(RecordId),
}

impl Placement {
    pub fn anchor(&self) -> Option<&RecordId> {
        match self {
            Placement::After(id) | Placement::Before(id) => Some(id),
            Placement::Start | Placement::End => None,
        }
    }
}

/// Outcome of a committed insert or move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Committed {
    pub id: RecordId,
    /// Domain the item now belongs to
    pub domain: OrderingDomain,
    /// Value the item was given
    pub value: OrderValue,
    /// Number of other records rewritten by a rebalance in the same commit
    pub rewritten: usize,
}

/// Outcome of an explicit rebalance or backfill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebalanceReport {
    pub domain: OrderingDomain,
    /// Records in the domain
    pub items: usize,
    /// Records whose value changed
    pub rewritten: usize,
}
