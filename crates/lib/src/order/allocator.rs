//! Key allocation for items placed into a domain.

use tracing::{debug, info};

use crate::{
    Error, Result,
    key::{KeyError, KeySpace, OrderKey},
    order::{
        OrderError, OrderedItem,
        rebalance::{RebalancePlan, Rebalancer},
        snapshot::DomainSnapshot,
    },
};

/// Keys for a placement, and the rebalance they depend on, if any.
#[derive(Debug)]
pub(crate) struct Allocation {
    pub(crate) keys: Vec<OrderKey>,
    pub(crate) plan: Option<RebalancePlan>,
}

/// Synthesises keys for a slot, rebalancing the domain when it has run out
/// of precision there.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeyAllocator {
    space: KeySpace,
    rebalancer: Rebalancer,
}

fn requires_rebalance(err: &Error) -> bool {
    matches!(err, Error::Key(key) if key.requires_rebalance())
}

fn neighbour_key(item: Option<&OrderedItem>) -> Result<Option<&OrderKey>> {
    match item {
        None => Ok(None),
        Some(item) => match item.value.key() {
            Some(key) => Ok(Some(key)),
            None => Err(KeyError::MissingKey {
                id: item.id().to_string(),
            }
            .into()),
        },
    }
}

impl KeyAllocator {
    pub(crate) fn new(space: KeySpace) -> Self {
        Self {
            space,
            rebalancer: Rebalancer::new(space),
        }
    }

    pub(crate) fn space(&self) -> KeySpace {
        self.space
    }

    pub(crate) fn rebalancer(&self) -> Rebalancer {
        self.rebalancer
    }

    /// Allocates `count` ascending keys for `slot` in `snapshot`.
    ///
    /// The snapshot must not contain the items being placed. When the slot
    /// has no room the whole domain is planned for a rebalance that reserves
    /// the slot, and allocation is retried once against the planned keys. The
    /// caller commits the plan and the placed items together.
    pub(crate) fn allocate(
        &self,
        snapshot: &DomainSnapshot,
        slot: usize,
        count: usize,
    ) -> Result<Allocation> {
        match self.keys_for_slot(snapshot, slot, count) {
            Ok(keys) => Ok(Allocation { keys, plan: None }),
            Err(err) if requires_rebalance(&err) => {
                info!(domain = %snapshot.domain, reason = %err, "Rebalancing domain");
                let plan = self.rebalancer.plan(snapshot, Some((slot, count)))?;
                let rebalanced = plan.apply(snapshot);
                match self.keys_for_slot(&rebalanced, slot, count) {
                    Ok(keys) => Ok(Allocation {
                        keys,
                        plan: Some(plan),
                    }),
                    Err(err) if requires_rebalance(&err) => Err(OrderError::InvariantViolation {
                        domain: snapshot.domain.to_string(),
                        reason: format!("no room after rebalance: {err}"),
                    }
                    .into()),
                    Err(err) => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    fn keys_for_slot(
        &self,
        snapshot: &DomainSnapshot,
        slot: usize,
        count: usize,
    ) -> Result<Vec<OrderKey>> {
        let (prev_item, next_item) = snapshot.neighbours(slot);
        let prev = neighbour_key(prev_item)?;
        let next = neighbour_key(next_item)?;
        // Separate service instances can store the same key twice.
        if let (Some(p), Some(n), Some(a), Some(b)) = (prev, next, prev_item, next_item)
            && p == n
        {
            return Err(KeyError::SharedKey {
                prev: a.id().to_string(),
                next: b.id().to_string(),
                key: p.as_str().to_string(),
            }
            .into());
        }
        let keys = match count {
            1 => vec![self.space.midpoint(prev, next)?],
            _ => self.space.keys_between(prev, next, count)?,
        };
        debug!(domain = %snapshot.domain, slot, count, "Allocated keys");
        Ok(keys)
    }
}
