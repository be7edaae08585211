use serde_json::json;

use orderable::record::{Filter, Patch, Record, RecordId};

use crate::helpers::{doc, test_backend};

fn record(collection: &str, id: &str, created_at: u64, data: serde_json::Value) -> Record {
    Record::new(collection, RecordId::new(id), created_at, doc(data))
}

#[tokio::test]
async fn test_create_and_get() {
    let backend = test_backend().await;
    backend
        .create(record("posts", "p1", 10, json!({"title": "Hello"})))
        .await
        .unwrap();

    let loaded = backend.get("posts", &RecordId::new("p1")).await.unwrap();
    assert_eq!(loaded.created_at, 10);
    assert_eq!(loaded.str_field("title"), Some("Hello"));

    let missing = backend.get("posts", &RecordId::new("nope")).await;
    assert!(missing.unwrap_err().is_not_found());
    let other_collection = backend.get("pages", &RecordId::new("p1")).await;
    assert!(other_collection.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_duplicate_create_conflicts() {
    let backend = test_backend().await;
    backend
        .create(record("posts", "p1", 10, json!({})))
        .await
        .unwrap();
    let err = backend
        .create(record("posts", "p1", 11, json!({})))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    // Same id in another collection is a different record
    backend
        .create(record("pages", "p1", 12, json!({})))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_patches_fields() {
    let backend = test_backend().await;
    backend
        .create(record("posts", "p1", 10, json!({"title": "A", "_order": "V"})))
        .await
        .unwrap();

    let mut patch = Patch::new();
    patch.insert("_order".into(), json!("W"));
    patch.insert("title".into(), serde_json::Value::Null);
    backend
        .update("posts", &RecordId::new("p1"), patch)
        .await
        .unwrap();

    let loaded = backend.get("posts", &RecordId::new("p1")).await.unwrap();
    assert_eq!(loaded.str_field("_order"), Some("W"));
    assert!(loaded.field("title").is_none());

    let err = backend
        .update("posts", &RecordId::new("nope"), Patch::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_query_and_delete_by_filter() {
    let backend = test_backend().await;
    for (id, parent) in [("a", "p1"), ("b", "p1"), ("c", "p2")] {
        backend
            .create(record("items", id, 1, json!({"parent": parent})))
            .await
            .unwrap();
    }
    backend
        .create(record("items", "d", 1, json!({})))
        .await
        .unwrap();

    let mut p1: Vec<String> = backend
        .query("items", &Filter::eq("parent", "p1"))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id.to_string())
        .collect();
    p1.sort();
    assert_eq!(p1, ["a", "b"]);

    let orphans = backend
        .query("items", &Filter::missing("parent"))
        .await
        .unwrap();
    assert_eq!(orphans.len(), 1);
    assert!(backend.query("empty", &Filter::All).await.unwrap().is_empty());

    let removed = backend
        .delete("items", &Filter::eq("parent", "p1"))
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(backend.query("items", &Filter::All).await.unwrap().len(), 2);
    assert_eq!(backend.delete("items", &Filter::All).await.unwrap(), 2);
    assert_eq!(backend.delete("items", &Filter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_collections_lists_non_empty() {
    let backend = test_backend().await;
    backend
        .create(record("posts", "p1", 1, json!({})))
        .await
        .unwrap();
    backend
        .create(record("authors", "a1", 1, json!({})))
        .await
        .unwrap();
    backend
        .create(record("drafts", "d1", 1, json!({})))
        .await
        .unwrap();
    backend.delete("drafts", &Filter::All).await.unwrap();

    assert_eq!(backend.collections().await.unwrap(), ["authors", "posts"]);
}
