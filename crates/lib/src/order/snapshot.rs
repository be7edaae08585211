//! Sorted view of one domain, taken under its lock.

use crate::{
    Result,
    key::OrderKey,
    order::{OrderValue, OrderedItem, Placement},
    record::RecordId,
    scope::{OrderingDomain, ScopeError},
};

#[derive(Debug, Clone)]
pub(crate) struct DomainSnapshot {
    pub(crate) domain: OrderingDomain,
    /// Members in display order
    pub(crate) items: Vec<OrderedItem>,
}

impl DomainSnapshot {
    pub(crate) fn new(domain: OrderingDomain, mut items: Vec<OrderedItem>) -> Self {
        items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self { domain, items }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn position(&self, id: &RecordId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// The same domain with the given items taken out.
    pub(crate) fn without(&self, ids: &[RecordId]) -> Self {
        Self {
            domain: self.domain.clone(),
            items: self
                .items
                .iter()
                .filter(|item| !ids.contains(item.id()))
                .cloned()
                .collect(),
        }
    }

    /// Index in `items` where placed items are inserted.
    pub(crate) fn slot(&self, placement: &Placement) -> Result<usize> {
        let anchored = |anchor: &RecordId| -> Result<usize> {
            self.position(anchor).ok_or_else(|| {
                ScopeError::AnchorNotInDomain {
                    anchor: anchor.clone(),
                    domain: self.domain.to_string(),
                }
                .into()
            })
        };
        match placement {
            Placement::Start => Ok(0),
            Placement::End => Ok(self.items.len()),
            Placement::After(anchor) => anchored(anchor).map(|i| i + 1),
            Placement::Before(anchor) => anchored(anchor),
        }
    }

    /// The items on either side of a slot.
    pub(crate) fn neighbours(&self, slot: usize) -> (Option<&OrderedItem>, Option<&OrderedItem>) {
        let prev = slot.checked_sub(1).and_then(|i| self.items.get(i));
        (prev, self.items.get(slot))
    }

    /// Copy with each item's value replaced by the matching key.
    pub(crate) fn with_keys(&self, keys: &[OrderKey]) -> Self {
        Self {
            domain: self.domain.clone(),
            items: self
                .items
                .iter()
                .zip(keys)
                .map(|(item, key)| OrderedItem {
                    value: OrderValue::Key(key.clone()),
                    ..item.clone()
                })
                .collect(),
        }
    }
}
