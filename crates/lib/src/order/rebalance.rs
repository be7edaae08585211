//! Domain-wide key reassignment.

use serde_json::Value;
use tracing::debug;

use crate::{
    Result,
    backend::WriteOp,
    key::{KeySpace, OrderKey},
    order::snapshot::DomainSnapshot,
    record::{Patch, RecordId},
};

/// Reassigns evenly spread keys to every member of a domain.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Rebalancer {
    space: KeySpace,
}

/// Keys a rebalance would give each member, in display order.
#[derive(Debug, Clone)]
pub(crate) struct RebalancePlan {
    keys: Vec<OrderKey>,
    changed: Vec<(RecordId, OrderKey)>,
}

impl Rebalancer {
    pub(crate) fn new(space: KeySpace) -> Self {
        Self { space }
    }

    /// Plans new keys for every item of the snapshot, preserving its order.
    ///
    /// `reserve` is `(slot, count)`: that many key positions are left free at
    /// `slot`, so items about to be placed there fit after the rebalance.
    pub(crate) fn plan(
        &self,
        snapshot: &DomainSnapshot,
        reserve: Option<(usize, usize)>,
    ) -> Result<RebalancePlan> {
        let (slot, count) = reserve.unwrap_or((snapshot.len(), 0));
        let keys: Vec<OrderKey> = self
            .space
            .spread(snapshot.len() + count)?
            .into_iter()
            .enumerate()
            .filter(|(i, _)| *i < slot || *i >= slot + count)
            .map(|(_, key)| key)
            .collect();

        let changed: Vec<(RecordId, OrderKey)> = snapshot
            .items
            .iter()
            .zip(&keys)
            .filter(|(item, key)| item.value.key() != Some(*key))
            .map(|(item, key)| (item.id().clone(), key.clone()))
            .collect();

        debug!(
            domain = %snapshot.domain,
            items = snapshot.len(),
            reserved = count,
            changed = changed.len(),
            "Planned rebalance"
        );
        Ok(RebalancePlan { keys, changed })
    }
}

impl RebalancePlan {
    /// The snapshot as it will look once the plan is written.
    pub(crate) fn apply(&self, snapshot: &DomainSnapshot) -> DomainSnapshot {
        snapshot.with_keys(&self.keys)
    }

    /// Number of records the plan rewrites.
    pub(crate) fn rewritten(&self) -> usize {
        self.changed.len()
    }

    /// Updates for the records whose key changes.
    pub(crate) fn write_ops(&self, collection: &str, order_field: &str) -> Vec<WriteOp> {
        self.changed
            .iter()
            .map(|(id, key)| WriteOp::Update {
                collection: collection.to_string(),
                id: id.clone(),
                patch: key_patch(order_field, key),
            })
            .collect()
    }
}

/// Patch setting a record's order key.
pub(crate) fn key_patch(order_field: &str, key: &OrderKey) -> Patch {
    let mut patch = Patch::new();
    patch.insert(order_field.to_string(), Value::from(key.as_str()));
    patch
}
