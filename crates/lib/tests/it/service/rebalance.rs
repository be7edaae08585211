use std::sync::{Arc, atomic::Ordering};

use serde_json::json;

use orderable::{
    Error,
    backend::BackendImpl,
    order::{CollectionConfig, OrderError, Placement},
    record::Filter,
};

use crate::helpers::{FailingBackend, assert_keys_increasing, doc, ids_in, posts_service, service_on};

#[tokio::test]
async fn test_rebalance_preserves_order_and_restores_room() {
    let service = posts_service(3).await;
    let first = service.insert(Default::default(), Placement::End).await.unwrap();
    let domain = first.domain.clone();
    // Crowd keys right after the first item
    for _ in 0..12 {
        service
            .insert(Default::default(), Placement::After(first.id.clone()))
            .await
            .unwrap();
    }
    let before = ids_in(&service, &domain).await;

    let report = service.rebalance(&domain).await.unwrap();
    assert_eq!(report.items, 13);
    assert!(report.rewritten > 0);
    assert_eq!(ids_in(&service, &domain).await, before);

    let items: Vec<_> = service.list_ordered(&domain).await.unwrap().collect();
    let space = service.key_space();
    for pair in items.windows(2) {
        let (a, b) = (pair[0].value.key(), pair[1].value.key());
        assert!(space.midpoint(a, b).is_ok(), "no room between {a:?} and {b:?}");
    }
}

#[tokio::test]
async fn test_rebalance_is_idempotent() {
    let service = posts_service(6).await;
    let mut domain = None;
    for _ in 0..5 {
        domain = Some(service.insert(Default::default(), Placement::Start).await.unwrap().domain);
    }
    let domain = domain.unwrap();
    service.rebalance(&domain).await.unwrap();
    let again = service.rebalance(&domain).await.unwrap();
    assert_eq!(again.items, 5);
    assert_eq!(again.rewritten, 0);
}

#[tokio::test]
async fn test_rebalance_of_empty_domain() {
    let service = posts_service(6).await;
    let report = service
        .rebalance(&orderable::OrderingDomain::global("posts"))
        .await
        .unwrap();
    assert_eq!(report.items, 0);
    assert_eq!(report.rewritten, 0);
}

#[tokio::test]
async fn test_failed_rebalance_leaves_domain_unchanged() {
    let failing = Arc::new(FailingBackend::new());
    let backend: Arc<dyn BackendImpl> = failing.clone();
    let service = service_on(backend, CollectionConfig::new("posts").with_key_length(1));

    // One digit: 31 is V, 32 is W, and nothing fits between them.
    let a = service.insert(doc(json!({"title": "A"})), Placement::End).await.unwrap();
    let b = service.insert(doc(json!({"title": "B"})), Placement::End).await.unwrap();
    let domain = a.domain.clone();
    let before: Vec<_> = service
        .list_ordered(&domain)
        .await
        .unwrap()
        .map(|i| i.value)
        .collect();

    failing.reject_batches_over(1);
    let err = service
        .insert(doc(json!({"title": "C"})), Placement::After(a.id.clone()))
        .await
        .unwrap_err();
    assert!(err.is_rebalance_failure());
    assert!(matches!(err, Error::Order(OrderError::RebalanceFailed { .. })));
    assert_eq!(failing.rejected.load(Ordering::SeqCst), 1);

    let after: Vec<_> = service
        .list_ordered(&domain)
        .await
        .unwrap()
        .map(|i| i.value)
        .collect();
    assert_eq!(before, after);
    assert_eq!(ids_in(&service, &domain).await, [a.id.clone(), b.id.clone()]);
    assert_eq!(
        failing.query("posts", &Filter::All).await.unwrap().len(),
        2
    );

    // Once the store accepts batches again the same insert succeeds
    failing.reject_batches_over(usize::MAX);
    let c = service
        .insert(doc(json!({"title": "C"})), Placement::After(a.id.clone()))
        .await
        .unwrap();
    assert!(c.rewritten > 0);
    assert_eq!(ids_in(&service, &domain).await, [a.id, c.id, b.id]);
    assert_keys_increasing(&service, &domain).await;
}

#[tokio::test]
async fn test_full_key_space_reports_capacity() {
    let service = posts_service(1).await;
    let first = service.insert(Default::default(), Placement::End).await.unwrap();
    let mut result = Ok(first.clone());
    for _ in 0..64 {
        result = service
            .insert(Default::default(), Placement::After(first.id.clone()))
            .await;
        if result.is_err() {
            break;
        }
    }
    let err = result.unwrap_err();
    assert!(err.is_capacity_error());
    assert_keys_increasing(&service, &first.domain).await;
}
