use serde_json::json;

use orderable::{
    Record, RecordId,
    order::{OrderValue, Placement},
    scope::OrderingDomain,
};

use crate::helpers::{assert_keys_increasing, doc, posts_service, titles_in};

#[tokio::test]
async fn test_backfill_appends_keyless_records_in_creation_order() {
    let service = posts_service(12).await;
    let keyed = service
        .insert(doc(json!({"title": "keyed"})), Placement::End)
        .await
        .unwrap();
    let backend = service.backend();
    for (id, created_at) in [("late", 20), ("early", 10)] {
        backend
            .create(Record::new(
                "posts",
                RecordId::new(id),
                created_at,
                doc(json!({ "title": id })),
            ))
            .await
            .unwrap();
    }
    let domain = OrderingDomain::global("posts");

    let missing = service
        .list_ordered(&domain)
        .await
        .unwrap()
        .filter(|i| i.value == OrderValue::Missing)
        .count();
    assert_eq!(missing, 2);

    let report = service.backfill(&domain).await.unwrap();
    assert_eq!(report.items, 3);
    assert_eq!(report.rewritten, 2);
    assert_eq!(titles_in(&service, &domain).await, ["keyed", "early", "late"]);
    assert_keys_increasing(&service, &domain).await;

    let stored = backend.get("posts", &keyed.id).await.unwrap();
    assert_eq!(stored.str_field("_order"), keyed.value.key().map(|k| k.as_str()));

    let again = service.backfill(&domain).await.unwrap();
    assert_eq!(again.rewritten, 0);
}

#[tokio::test]
async fn test_insert_next_to_keyless_records_rebalances() {
    let service = posts_service(12).await;
    service
        .backend()
        .create(Record::new("posts", RecordId::new("old"), 1, doc(json!({"title": "old"}))))
        .await
        .unwrap();

    let committed = service
        .insert(doc(json!({"title": "new"})), Placement::End)
        .await
        .unwrap();
    assert_eq!(committed.rewritten, 1);

    let domain = OrderingDomain::global("posts");
    assert_eq!(titles_in(&service, &domain).await, ["old", "new"]);
    assert_keys_increasing(&service, &domain).await;
}

#[tokio::test]
async fn test_overlong_stored_keys_are_repaired() {
    let service = posts_service(2).await;
    let backend = service.backend();
    for (id, key) in [("a", "V"), ("b", "VVVV")] {
        backend
            .create(Record::new(
                "posts",
                RecordId::new(id),
                1,
                doc(json!({"title": id, "_order": key})),
            ))
            .await
            .unwrap();
    }
    let committed = service
        .insert(doc(json!({"title": "between"})), Placement::After(RecordId::new("a")))
        .await
        .unwrap();
    assert!(committed.rewritten > 0);

    let domain = OrderingDomain::global("posts");
    assert_eq!(titles_in(&service, &domain).await, ["a", "between", "b"]);
    assert_keys_increasing(&service, &domain).await;
}
