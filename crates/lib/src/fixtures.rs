//! Demo collections and their seed data.
//!
//! Four orderings over three collections:
//!
//! - `orderable-join`: parent records, ordered globally.
//! - `orderable`: ordered globally, and independently per parent through the
//!   `orderableField` relation. The two orderings use different order fields
//!   on the same records.
//! - `non-unique-sort`: posts sharing integer buckets in `order`.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::{
    Clock, Result,
    backend::BackendImpl,
    order::{CollectionConfig, OrderService, Placement},
    record::{Filter, RecordId},
    scope::OrderingDomain,
};

pub const ORDERABLE: &str = "orderable";
pub const ORDERABLE_JOIN: &str = "orderable-join";
pub const NON_UNIQUE_SORT: &str = "non-unique-sort";

/// Relation from `orderable` to `orderable-join`.
pub const RELATION_FIELD: &str = "orderableField";
/// Order field of the per-parent ordering of `orderable`.
pub const JOIN_ORDER_FIELD: &str = "_orderable_orderableField_order";
/// Bucket field of `non-unique-sort`.
pub const BUCKET_FIELD: &str = "order";

/// Number of posts seeded into `non-unique-sort`.
pub const POST_COUNT: usize = 10;

/// Global ordering of `orderable`.
pub fn orderable() -> CollectionConfig {
    CollectionConfig::new(ORDERABLE)
}

/// Per-parent ordering of `orderable`.
pub fn orderable_by_join() -> CollectionConfig {
    CollectionConfig::new(ORDERABLE)
        .joined(RELATION_FIELD, ORDERABLE_JOIN)
        .with_order_field(JOIN_ORDER_FIELD)
}

pub fn orderable_join() -> CollectionConfig {
    CollectionConfig::new(ORDERABLE_JOIN)
}

pub fn non_unique_sort() -> CollectionConfig {
    CollectionConfig::new(NON_UNIQUE_SORT).non_unique(BUCKET_FIELD)
}

/// Every demo configuration.
pub fn configs() -> Vec<CollectionConfig> {
    vec![
        orderable(),
        orderable_by_join(),
        orderable_join(),
        non_unique_sort(),
    ]
}

/// Bucket of the `index`-th seeded post: four in bucket 1, four in bucket 2,
/// the rest in bucket 3.
pub fn bucket_for(index: usize) -> i64 {
    match index {
        0..=3 => 1,
        4..=7 => 2,
        _ => 3,
    }
}

/// Services for the demo collections over one backend.
#[derive(Debug, Clone)]
pub struct DemoServices {
    pub orderable: OrderService,
    pub orderable_by_join: OrderService,
    pub orderable_join: OrderService,
    pub non_unique_sort: OrderService,
}

impl DemoServices {
    pub fn new(backend: Arc<dyn BackendImpl>, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::with_key_length(backend, clock, None)
    }

    /// Like [`new`](Self::new), overriding the key length of every ordering.
    pub fn with_key_length(
        backend: Arc<dyn BackendImpl>,
        clock: Arc<dyn Clock>,
        key_length: Option<usize>,
    ) -> Result<Self> {
        let build = |config: CollectionConfig| {
            let config = match key_length {
                Some(length) => config.with_key_length(length),
                None => config,
            };
            OrderService::with_clock(Arc::clone(&backend), config, Arc::clone(&clock))
        };
        Ok(Self {
            orderable: build(orderable())?,
            orderable_by_join: build(orderable_by_join())?,
            orderable_join: build(orderable_join())?,
            non_unique_sort: build(non_unique_sort())?,
        })
    }

    /// Every service, for iteration.
    pub fn all(&self) -> [&OrderService; 4] {
        [
            &self.orderable,
            &self.orderable_by_join,
            &self.orderable_join,
            &self.non_unique_sort,
        ]
    }
}

/// Ids created by [`seed`].
#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub join_a: RecordId,
    pub join_b: RecordId,
    /// Items A to D, all related to Join A
    pub orderable: Vec<RecordId>,
    pub posts: Vec<RecordId>,
}

fn titled(title: impl Into<String>) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("title".to_string(), Value::String(title.into()));
    data
}

/// Replaces the demo collections' contents with the fixture data.
///
/// Join A gets items A, B, C and D in that order, Join B stays empty, and
/// ten posts are spread over buckets 1 to 3.
pub async fn seed(services: &DemoServices) -> Result<SeedReport> {
    let backend = services.orderable.backend();
    for slug in [ORDERABLE, ORDERABLE_JOIN, NON_UNIQUE_SORT] {
        let removed = backend.delete(slug, &Filter::All).await?;
        info!(collection = slug, removed, "Cleared collection");
    }

    let join_a = services
        .orderable_join
        .insert(titled("Join A"), Placement::End)
        .await?
        .id;

    let mut orderable = Vec::new();
    for title in ["A", "B", "C", "D"] {
        let mut data = titled(title);
        data.insert(RELATION_FIELD.to_string(), json!(join_a.as_str()));
        let committed = services.orderable.insert(data, Placement::End).await?;
        orderable.push(committed.id);
    }
    // The global insert leaves the per-parent key unset.
    services
        .orderable_by_join
        .backfill(&OrderingDomain::relation(ORDERABLE, join_a.clone()))
        .await?;

    let join_b = services
        .orderable_join
        .insert(titled("Join B"), Placement::End)
        .await?
        .id;

    let mut posts = Vec::with_capacity(POST_COUNT);
    for i in 0..POST_COUNT {
        let mut data = titled(format!("Post {i}"));
        data.insert(BUCKET_FIELD.to_string(), json!(bucket_for(i)));
        let committed = services
            .non_unique_sort
            .insert(data, Placement::End)
            .await?;
        posts.push(committed.id);
    }

    info!(
        items = orderable.len(),
        posts = posts.len(),
        "Seeded demo collections"
    );
    Ok(SeedReport {
        join_a,
        join_b,
        orderable,
        posts,
    })
}
