//! An open backend plus the demo services over it.
//!
//! Every command opens a session, works through its services and closes it,
//! which writes in-memory data back to disk.

use std::{path::PathBuf, sync::Arc};

use orderable::{
    OrderService, OrderingDomain, SystemClock,
    backend::BackendImpl,
    fixtures::{self, DemoServices},
    scope::GroupKey,
};

use crate::backend::{create_backend, json_path, persist};
use crate::cli::{BackendConfig, Ordering};

pub struct Session {
    pub backend: Arc<dyn BackendImpl>,
    pub services: DemoServices,
    json_path: PathBuf,
}

impl Session {
    /// Open the configured backend.
    pub async fn open(config: &BackendConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let backend = create_backend(config).await?;
        let services = DemoServices::with_key_length(
            Arc::clone(&backend),
            Arc::new(SystemClock),
            config.key_length,
        )?;
        Ok(Self {
            backend,
            services,
            json_path: json_path(config),
        })
    }

    /// The service behind one of the demo orderings.
    pub fn service(&self, ordering: Ordering) -> &OrderService {
        match ordering {
            Ordering::Orderable => &self.services.orderable,
            Ordering::OrderableByJoin => &self.services.orderable_by_join,
            Ordering::OrderableJoin => &self.services.orderable_join,
            Ordering::NonUniqueSort => &self.services.non_unique_sort,
        }
    }

    /// The domain of `ordering` selected by `group`.
    pub fn domain(ordering: Ordering, group: Option<GroupKey>) -> OrderingDomain {
        let collection = match ordering {
            Ordering::Orderable | Ordering::OrderableByJoin => fixtures::ORDERABLE,
            Ordering::OrderableJoin => fixtures::ORDERABLE_JOIN,
            Ordering::NonUniqueSort => fixtures::NON_UNIQUE_SORT,
        };
        OrderingDomain {
            collection: collection.to_string(),
            group,
        }
    }

    /// Persist pending in-memory state.
    pub async fn close(self) -> Result<(), Box<dyn std::error::Error>> {
        persist(&self.backend, &self.json_path).await
    }
}
