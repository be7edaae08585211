//! Per-domain write serialization.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::scope::OrderingDomain;

/// One async mutex per ordering domain.
///
/// Writers to the same domain run one at a time; writers to different domains
/// never wait on each other. Operations spanning two domains take both locks
/// in a fixed order so they cannot deadlock.
#[derive(Debug, Default)]
pub(crate) struct DomainLocks {
    locks: Mutex<HashMap<OrderingDomain, Arc<AsyncMutex<()>>>>,
}

/// Holds the locks of one or more domains until dropped.
#[derive(Debug)]
pub(crate) struct DomainGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl DomainLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to every listed domain.
    pub(crate) async fn lock(&self, domains: &[&OrderingDomain]) -> DomainGuard {
        let mut sorted: Vec<OrderingDomain> = domains.iter().map(|d| (*d).clone()).collect();
        sorted.sort();
        sorted.dedup();

        let mutexes: Vec<Arc<AsyncMutex<()>>> = {
            let mut locks = self.locks.lock().unwrap();
            // Entries only referenced by the map are idle.
            locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
            sorted
                .into_iter()
                .map(|domain| Arc::clone(locks.entry(domain).or_default()))
                .collect()
        };

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }
        DomainGuard { _guards: guards }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}
