//! User-controlled ordering of a collection.
//!
//! [`OrderService`] is the entry point. It owns the configuration of one
//! collection and coordinates everything needed to place records:
//!
//! 1. the collection's [`GroupScope`] resolves the ordering domain,
//! 2. the domain lock is taken and the domain is read as a sorted snapshot,
//! 3. keys are allocated for the requested slot, planning a rebalance when the
//!    slot has run out of precision,
//! 4. the rebalance (if any) and the placed records are written in a single
//!    atomic batch.
//!
//! Non-unique collections skip key allocation entirely: a record's bucket is
//! its order value and ties break on creation time.

use std::{collections::HashSet, fmt, sync::Arc};

use handle_trait::Handle;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::{
    Clock, Result, SystemClock,
    backend::{BackendImpl, WriteOp},
    constants::MAX_MOVE_ATTEMPTS,
    key::KeySpace,
    record::{Filter, Record, RecordId},
    scope::{GroupKey, GroupScope, OrderingDomain, OrderingMode},
};

mod allocator;
mod config;
pub mod errors;
mod item;
mod locks;
mod rebalance;
mod snapshot;

use allocator::KeyAllocator;
use locks::DomainLocks;
use rebalance::key_patch;
use snapshot::DomainSnapshot;

pub use config::CollectionConfig;
pub use errors::OrderError;
pub use item::{Committed, OrderValue, OrderedItem, Placement, RebalanceReport};

/// Items of one domain in display order.
///
/// Produced by [`OrderService::list_ordered`]. Calling `list_ordered` again
/// restarts from the first item with a fresh read of the store.
#[derive(Debug)]
pub struct OrderedItems {
    domain: OrderingDomain,
    items: std::vec::IntoIter<OrderedItem>,
}

impl OrderedItems {
    pub fn domain(&self) -> &OrderingDomain {
        &self.domain
    }
}

impl Iterator for OrderedItems {
    type Item = OrderedItem;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl ExactSizeIterator for OrderedItems {}

/// Orders the records of one collection.
///
/// Cloning is cheap and every clone shares the same domain locks, so clone
/// the service rather than constructing a second one for the same
/// collection.
///
/// Domain locks only exclude writers going through this service and its
/// clones. Separate instances, including ones in other processes, can race
/// and store equal keys. Such records still list deterministically, and the
/// next placement between them rebalances the domain.
///
/// # Example
///
/// ```
/// # use std::sync::Arc;
/// # use orderable::{backend::database::InMemory, order::{CollectionConfig, OrderService, Placement}};
/// # #[tokio::main]
/// # async fn main() -> orderable::Result<()> {
/// let service = OrderService::new(Arc::new(InMemory::new()), CollectionConfig::new("posts"))?;
///
/// let first = service.insert(Default::default(), Placement::End).await?;
/// let second = service.insert(Default::default(), Placement::Start).await?;
///
/// let ids: Vec<_> = service
///     .list_ordered(&first.domain)
///     .await?
///     .map(|item| item.record.id)
///     .collect();
/// assert_eq!(ids, vec![second.id, first.id]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Handle)]
pub struct OrderService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    backend: Arc<dyn BackendImpl>,
    config: CollectionConfig,
    scope: Arc<dyn GroupScope>,
    allocator: KeyAllocator,
    clock: Arc<dyn Clock>,
    locks: DomainLocks,
}

impl fmt::Debug for ServiceInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceInner")
            .field("config", &self.config)
            .field("scope", &self.scope)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl OrderService {
    /// Creates a service for one collection using the system clock.
    pub fn new(backend: Arc<dyn BackendImpl>, config: CollectionConfig) -> Result<Self> {
        Self::with_clock(backend, config, Arc::new(SystemClock))
    }

    /// Creates a service with a custom clock for creation timestamps.
    pub fn with_clock(
        backend: Arc<dyn BackendImpl>,
        config: CollectionConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let space = KeySpace::new(config.key_length)?;
        let scope = config.scope.build();
        Ok(Self {
            inner: Arc::new(ServiceInner {
                backend,
                scope,
                allocator: KeyAllocator::new(space),
                clock,
                locks: DomainLocks::new(),
                config,
            }),
        })
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.inner.config
    }

    pub fn key_space(&self) -> KeySpace {
        self.inner.allocator.space()
    }

    pub fn mode(&self) -> OrderingMode {
        self.inner.scope.mode()
    }

    pub fn backend(&self) -> &Arc<dyn BackendImpl> {
        &self.inner.backend
    }

    fn slug(&self) -> &str {
        &self.inner.config.slug
    }

    fn is_non_unique(&self) -> bool {
        self.mode() == OrderingMode::NonUnique
    }

    fn reject_non_unique(&self, operation: &'static str) -> Result<()> {
        if self.is_non_unique() {
            return Err(OrderError::UnsupportedInNonUniqueScope {
                collection: self.slug().to_string(),
                operation,
            }
            .into());
        }
        Ok(())
    }

    fn check_collection(&self, domain: &OrderingDomain) -> Result<()> {
        if domain.collection != self.slug() {
            return Err(OrderError::WrongCollection {
                expected: self.slug().to_string(),
                actual: domain.collection.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// The value a stored record is ordered by.
    fn value_of(&self, record: &Record, group: Option<&GroupKey>) -> OrderValue {
        match self.mode() {
            OrderingMode::NonUnique => match group {
                Some(GroupKey::Bucket(n)) => OrderValue::Bucket(*n),
                _ => OrderValue::Missing,
            },
            OrderingMode::Unique => record
                .str_field(&self.inner.config.order_field)
                .and_then(|raw| self.key_space().read_stored(raw))
                .map(OrderValue::Key)
                .unwrap_or(OrderValue::Missing),
        }
    }

    fn to_item(&self, record: Record) -> OrderedItem {
        let group = self
            .inner
            .scope
            .group_of(&record.collection, &record.data)
            .ok()
            .flatten();
        let value = self.value_of(&record, group.as_ref());
        OrderedItem {
            group,
            value,
            record,
        }
    }

    async fn snapshot(&self, domain: &OrderingDomain) -> Result<DomainSnapshot> {
        let filter = self.inner.scope.domain_filter(domain)?;
        let records = self.inner.backend.query(self.slug(), &filter).await?;
        let items = records.into_iter().map(|r| self.to_item(r)).collect();
        Ok(DomainSnapshot::new(domain.clone(), items))
    }

    /// Writes a batch, reporting failures of rebalancing batches as such.
    async fn commit(
        &self,
        domain: &OrderingDomain,
        ops: Vec<WriteOp>,
        rebalancing: bool,
    ) -> Result<()> {
        let count = ops.len();
        match self.inner.backend.apply_batch(ops).await {
            Ok(()) => {
                debug!(%domain, writes = count, rebalancing, "Committed batch");
                Ok(())
            }
            Err(err) if rebalancing => {
                warn!(%domain, error = %err, "Rebalance batch rejected");
                Err(OrderError::RebalanceFailed {
                    domain: domain.to_string(),
                    source: Box::new(err),
                }
                .into())
            }
            Err(err) => Err(err),
        }
    }

    /// Resolves the domain an existing record belongs to.
    pub async fn domain_of(&self, id: &RecordId) -> Result<OrderingDomain> {
        let record = self.inner.backend.get(self.slug(), id).await?;
        self.inner.scope.domain_of(self.slug(), &record.data)
    }

    /// Creates a record and places it in its domain.
    ///
    /// Any value already present in the order field is replaced. Non-unique
    /// collections only accept [`Placement::End`]: the record joins the end
    /// of its bucket.
    #[instrument(level = "debug", skip(self, data), fields(collection = %self.slug()))]
    pub async fn insert(
        &self,
        mut data: Map<String, Value>,
        placement: Placement,
    ) -> Result<Committed> {
        let backend = self.inner.backend.as_ref();
        let domain = self
            .inner
            .scope
            .resolve(backend, self.slug(), &data)
            .await?;
        let id = RecordId::generate();

        if self.is_non_unique() {
            if placement != Placement::End {
                return Err(OrderError::UnsupportedInNonUniqueScope {
                    collection: self.slug().to_string(),
                    operation: "insert relative to another item",
                }
                .into());
            }
            let value = domain
                .group
                .as_ref()
                .map(group_value)
                .unwrap_or(OrderValue::Missing);
            let _guard = self.inner.locks.lock(&[&domain]).await;
            let record = Record::new(self.slug(), id.clone(), self.inner.clock.now_millis(), data);
            self.commit(&domain, vec![WriteOp::Create(record)], false)
                .await?;
            return Ok(Committed {
                id,
                domain,
                value,
                rewritten: 0,
            });
        }

        let _guard = self.inner.locks.lock(&[&domain]).await;
        let snapshot = self.snapshot(&domain).await?;
        let slot = snapshot.slot(&placement)?;
        let mut allocation = self.inner.allocator.allocate(&snapshot, slot, 1)?;
        let key = allocation.keys.remove(0);

        data.insert(
            self.inner.config.order_field.clone(),
            Value::from(key.as_str()),
        );
        let record = Record::new(self.slug(), id.clone(), self.inner.clock.now_millis(), data);

        let (mut ops, rewritten) = match &allocation.plan {
            Some(plan) => (
                plan.write_ops(self.slug(), &self.inner.config.order_field),
                plan.rewritten(),
            ),
            None => (Vec::new(), 0),
        };
        ops.push(WriteOp::Create(record));
        self.commit(&domain, ops, allocation.plan.is_some()).await?;

        debug!(%domain, %id, %key, rewritten, "Inserted item");
        Ok(Committed {
            id,
            domain,
            value: OrderValue::Key(key),
            rewritten,
        })
    }

    /// Moves one item to a new position inside its current domain.
    pub async fn move_item(&self, id: &RecordId, placement: Placement) -> Result<Committed> {
        let mut committed = self
            .move_many(std::slice::from_ref(id), placement)
            .await?;
        committed.pop().ok_or_else(|| {
            OrderError::InvariantViolation {
                domain: self.slug().to_string(),
                reason: format!("move of {id} committed nothing"),
            }
            .into()
        })
    }

    /// Moves several items of one domain so they sit together, in the given
    /// order, at the placement.
    #[instrument(level = "debug", skip(self, ids), fields(collection = %self.slug(), count = ids.len()))]
    pub async fn move_many(
        &self,
        ids: &[RecordId],
        placement: Placement,
    ) -> Result<Vec<Committed>> {
        self.reject_non_unique("move")?;
        let Some(first) = ids.first() else {
            return Ok(Vec::new());
        };
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id) {
                return Err(OrderError::DuplicateItem { id: id.clone() }.into());
            }
        }
        if let Some(anchor) = placement.anchor()
            && seen.contains(anchor)
        {
            return Err(OrderError::SelfAnchor { id: anchor.clone() }.into());
        }

        for attempt in 1..=MAX_MOVE_ATTEMPTS {
            let domain = self.domain_of(first).await?;
            let _guard = self.inner.locks.lock(&[&domain]).await;
            let snapshot = self.snapshot(&domain).await?;

            // The item may have changed domain before the lock was taken.
            if snapshot.position(first).is_none() {
                warn!(%first, %domain, attempt, "Item left its domain, retrying move");
                continue;
            }
            if let Some(stray) = ids.iter().find(|id| snapshot.position(id).is_none()) {
                return Err(OrderError::ItemsInDifferentDomains {
                    id: stray.clone(),
                    domain: domain.to_string(),
                }
                .into());
            }

            let rest = snapshot.without(ids);
            let slot = rest.slot(&placement)?;
            let allocation = self.inner.allocator.allocate(&rest, slot, ids.len())?;

            let order_field = &self.inner.config.order_field;
            let (mut ops, rewritten) = match &allocation.plan {
                Some(plan) => (plan.write_ops(self.slug(), order_field), plan.rewritten()),
                None => (Vec::new(), 0),
            };
            for (id, key) in ids.iter().zip(&allocation.keys) {
                ops.push(WriteOp::Update {
                    collection: self.slug().to_string(),
                    id: id.clone(),
                    patch: key_patch(order_field, key),
                });
            }
            self.commit(&domain, ops, allocation.plan.is_some()).await?;

            debug!(%domain, moved = ids.len(), rewritten, "Moved items");
            return Ok(ids
                .iter()
                .zip(allocation.keys)
                .map(|(id, key)| Committed {
                    id: id.clone(),
                    domain: domain.clone(),
                    value: OrderValue::Key(key),
                    rewritten,
                })
                .collect());
        }

        Err(OrderError::Contention {
            id: first.clone(),
            attempts: MAX_MOVE_ATTEMPTS,
        }
        .into())
    }

    /// Moves an item into another group, placing it in the target domain.
    ///
    /// Both domains are locked for the duration. The item stops being
    /// considered by its old domain as soon as its grouping field changes.
    ///
    /// For non-unique collections the group is the bucket and only
    /// [`Placement::End`] is accepted. The item keeps its creation time, so
    /// it lands among the bucket's records by when it was created, not at
    /// the end of the bucket.
    #[instrument(level = "debug", skip(self), fields(collection = %self.slug()))]
    pub async fn move_to_group(
        &self,
        id: &RecordId,
        group: GroupKey,
        placement: Placement,
    ) -> Result<Committed> {
        if self.is_non_unique() && placement != Placement::End {
            return Err(OrderError::UnsupportedInNonUniqueScope {
                collection: self.slug().to_string(),
                operation: "move relative to another item",
            }
            .into());
        }
        if placement.anchor() == Some(id) {
            return Err(OrderError::SelfAnchor { id: id.clone() }.into());
        }
        let backend = self.inner.backend.as_ref();
        self.inner
            .scope
            .validate_group(backend, self.slug(), &group)
            .await?;
        let target = OrderingDomain {
            collection: self.slug().to_string(),
            group: Some(group.clone()),
        };

        for attempt in 1..=MAX_MOVE_ATTEMPTS {
            let source = self.domain_of(id).await?;
            if source == target && !self.is_non_unique() {
                return self.move_item(id, placement).await;
            }

            let _guard = self.inner.locks.lock(&[&source, &target]).await;
            if self.domain_of(id).await? != source {
                warn!(%id, %source, attempt, "Item left its domain, retrying move");
                continue;
            }

            let mut patch = self.inner.scope.group_patch(self.slug(), &group)?;
            if self.is_non_unique() {
                let update = WriteOp::Update {
                    collection: self.slug().to_string(),
                    id: id.clone(),
                    patch,
                };
                self.commit(&target, vec![update], false).await?;
                info!(%id, %source, %target, "Moved item to bucket");
                return Ok(Committed {
                    id: id.clone(),
                    domain: target,
                    value: group_value(&group),
                    rewritten: 0,
                });
            }

            let snapshot = self.snapshot(&target).await?;
            let slot = snapshot.slot(&placement)?;
            let mut allocation = self.inner.allocator.allocate(&snapshot, slot, 1)?;
            let key = allocation.keys.remove(0);

            let order_field = &self.inner.config.order_field;
            patch.extend(key_patch(order_field, &key));
            let (mut ops, rewritten) = match &allocation.plan {
                Some(plan) => (plan.write_ops(self.slug(), order_field), plan.rewritten()),
                None => (Vec::new(), 0),
            };
            ops.push(WriteOp::Update {
                collection: self.slug().to_string(),
                id: id.clone(),
                patch,
            });
            self.commit(&target, ops, allocation.plan.is_some()).await?;

            info!(%id, %source, %target, %key, rewritten, "Moved item to group");
            return Ok(Committed {
                id: id.clone(),
                domain: target,
                value: OrderValue::Key(key),
                rewritten,
            });
        }

        Err(OrderError::Contention {
            id: id.clone(),
            attempts: MAX_MOVE_ATTEMPTS,
        }
        .into())
    }

    /// Reads a domain in display order.
    ///
    /// Items sort by order value, then creation time, then id. Items without
    /// a usable value come last.
    pub async fn list_ordered(&self, domain: &OrderingDomain) -> Result<OrderedItems> {
        self.check_collection(domain)?;
        let snapshot = self.snapshot(domain).await?;
        Ok(OrderedItems {
            domain: snapshot.domain,
            items: snapshot.items.into_iter(),
        })
    }

    /// Reads the whole collection, grouped by domain and in display order
    /// inside each group.
    ///
    /// Records whose grouping field cannot be read are treated as ungrouped
    /// and come first.
    pub async fn list_all(&self) -> Result<Vec<OrderedItem>> {
        let records = self
            .inner
            .backend
            .query(self.slug(), &Filter::All)
            .await?;
        let mut items: Vec<OrderedItem> = records.into_iter().map(|r| self.to_item(r)).collect();
        items.sort_by(|a, b| (&a.group, a.sort_key()).cmp(&(&b.group, b.sort_key())));
        Ok(items)
    }

    /// Reassigns evenly spread keys to every item of a domain.
    ///
    /// Display order is unchanged. Items without a key are keyed after the
    /// rest, by creation time.
    #[instrument(level = "debug", skip(self, domain), fields(%domain))]
    pub async fn rebalance(&self, domain: &OrderingDomain) -> Result<RebalanceReport> {
        self.reject_non_unique("rebalance")?;
        self.check_collection(domain)?;

        let _guard = self.inner.locks.lock(&[domain]).await;
        let snapshot = self.snapshot(domain).await?;
        let plan = self.inner.allocator.rebalancer().plan(&snapshot, None)?;
        let ops = plan.write_ops(self.slug(), &self.inner.config.order_field);
        if !ops.is_empty() {
            self.commit(domain, ops, true).await?;
        }

        info!(%domain, items = snapshot.len(), rewritten = plan.rewritten(), "Rebalanced domain");
        Ok(RebalanceReport {
            domain: domain.clone(),
            items: snapshot.len(),
            rewritten: plan.rewritten(),
        })
    }

    /// Gives keys to the items of a domain that have none, after the keyed
    /// items and in creation order.
    ///
    /// Falls back to a full rebalance when the tail of the domain has no
    /// room left.
    #[instrument(level = "debug", skip(self, domain), fields(%domain))]
    pub async fn backfill(&self, domain: &OrderingDomain) -> Result<RebalanceReport> {
        self.reject_non_unique("backfill")?;
        self.check_collection(domain)?;

        let _guard = self.inner.locks.lock(&[domain]).await;
        let snapshot = self.snapshot(domain).await?;
        let missing: Vec<RecordId> = snapshot
            .items
            .iter()
            .filter(|item| item.value.is_missing())
            .map(|item| item.id().clone())
            .collect();
        if missing.is_empty() {
            return Ok(RebalanceReport {
                domain: domain.clone(),
                items: snapshot.len(),
                rewritten: 0,
            });
        }

        // Keyless items already sort last, so they fill the tail slot.
        let keyed = snapshot.without(&missing);
        let allocation =
            self.inner
                .allocator
                .allocate(&keyed, keyed.len(), missing.len())?;
        let order_field = &self.inner.config.order_field;
        let (mut ops, rewritten) = match &allocation.plan {
            Some(plan) => (plan.write_ops(self.slug(), order_field), plan.rewritten()),
            None => (Vec::new(), 0),
        };
        for (id, key) in missing.iter().zip(&allocation.keys) {
            ops.push(WriteOp::Update {
                collection: self.slug().to_string(),
                id: id.clone(),
                patch: key_patch(order_field, key),
            });
        }
        self.commit(domain, ops, allocation.plan.is_some()).await?;

        info!(%domain, keyed = missing.len(), rewritten, "Backfilled order keys");
        Ok(RebalanceReport {
            domain: domain.clone(),
            items: snapshot.len(),
            rewritten: rewritten + missing.len(),
        })
    }
}

fn group_value(group: &GroupKey) -> OrderValue {
    match group {
        GroupKey::Bucket(n) => OrderValue::Bucket(*n),
        GroupKey::Relation(_) => OrderValue::Missing,
    }
}
