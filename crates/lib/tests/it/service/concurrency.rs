use std::{collections::HashSet, sync::Arc};

use serde_json::json;

use orderable::{
    order::{CollectionConfig, Placement},
    record::{Record, RecordId},
    scope::{GroupKey, OrderingDomain},
};

use crate::helpers::{assert_keys_increasing, doc, ids_in, posts_service, service_on, test_backend};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_get_distinct_keys() {
    // Short keys so concurrent inserts also race through rebalances
    let service = posts_service(2).await;
    let first = service.insert(Default::default(), Placement::End).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..32 {
        let service = service.clone();
        let anchor = first.id.clone();
        handles.push(tokio::spawn(async move {
            let placement = if i % 2 == 0 {
                Placement::After(anchor)
            } else {
                Placement::End
            };
            service.insert(Default::default(), placement).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let items: Vec<_> = service.list_ordered(&first.domain).await.unwrap().collect();
    assert_eq!(items.len(), 33);
    let keys: HashSet<_> = items.iter().map(|i| i.value.clone()).collect();
    assert_eq!(keys.len(), 33);
    assert_keys_increasing(&service, &first.domain).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_moves_keep_every_item() {
    let service = posts_service(4).await;
    let mut ids = Vec::new();
    let mut domain = None;
    for _ in 0..10 {
        let committed = service.insert(Default::default(), Placement::End).await.unwrap();
        ids.push(committed.id);
        domain = Some(committed.domain);
    }
    let domain = domain.unwrap();

    let mut handles = Vec::new();
    for round in 0..20 {
        let service = service.clone();
        let id = ids[round % ids.len()].clone();
        let anchor = ids[(round * 7 + 3) % ids.len()].clone();
        handles.push(tokio::spawn(async move {
            let placement = if id == anchor {
                Placement::Start
            } else if round % 2 == 0 {
                Placement::After(anchor)
            } else {
                Placement::Before(anchor)
            };
            service.move_item(&id, placement).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut listed = ids_in(&service, &domain).await;
    listed.sort();
    let mut expected = ids.clone();
    expected.sort();
    assert_eq!(listed, expected);
    assert_keys_increasing(&service, &domain).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cross_group_moves() {
    let backend = test_backend().await;
    for id in ["g1", "g2"] {
        backend
            .create(Record::new("groups", RecordId::new(id), 1, Default::default()))
            .await
            .unwrap();
    }
    let service = service_on(
        Arc::clone(&backend),
        CollectionConfig::new("cards").joined("group", "groups"),
    );

    let mut ids = Vec::new();
    for i in 0..12 {
        let group = if i % 2 == 0 { "g1" } else { "g2" };
        let committed = service
            .insert(doc(json!({ "group": group })), Placement::End)
            .await
            .unwrap();
        ids.push(committed.id);
    }

    let mut handles = Vec::new();
    for (i, id) in ids.iter().cloned().enumerate() {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let target = if i % 2 == 0 { "g2" } else { "g1" };
            service
                .move_to_group(
                    &id,
                    GroupKey::Relation(RecordId::new(target)),
                    Placement::Start,
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let g1 = OrderingDomain::relation("cards", "g1");
    let g2 = OrderingDomain::relation("cards", "g2");
    assert_eq!(ids_in(&service, &g1).await.len(), 6);
    assert_eq!(ids_in(&service, &g2).await.len(), 6);
    assert_keys_increasing(&service, &g1).await;
    assert_keys_increasing(&service, &g2).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_separate_services_on_one_store() {
    // Each service has its own locks, as separate processes would
    let backend = test_backend().await;
    let left = service_on(Arc::clone(&backend), CollectionConfig::new("posts"));
    let right = service_on(Arc::clone(&backend), CollectionConfig::new("posts"));
    let domain = OrderingDomain::global("posts");

    let mut handles = Vec::new();
    for i in 0..24 {
        let service = if i % 2 == 0 { left.clone() } else { right.clone() };
        handles.push(tokio::spawn(async move {
            service.insert(Default::default(), Placement::End).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let listed = ids_in(&left, &domain).await;
    assert_eq!(listed.len(), 24);
    assert_eq!(ids_in(&right, &domain).await, listed);

    // Racing writers may have stored equal keys; placements still succeed
    for (i, id) in listed.iter().enumerate().skip(1) {
        let service = if i % 2 == 0 { &left } else { &right };
        service
            .move_item(id, Placement::After(listed[0].clone()))
            .await
            .unwrap();
    }
    let mut reordered = vec![listed[0].clone()];
    reordered.extend(listed[1..].iter().rev().cloned());
    assert_eq!(ids_in(&left, &domain).await, reordered);

    left.rebalance(&domain).await.unwrap();
    assert_keys_increasing(&right, &domain).await;
}
