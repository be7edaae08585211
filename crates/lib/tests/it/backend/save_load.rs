use serde_json::json;
use tempfile::TempDir;

use orderable::{
    backend::{BackendImpl, database::InMemory},
    record::{Filter, Record, RecordId},
};

use crate::helpers::doc;

#[tokio::test]
async fn test_in_memory_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");

    {
        let backend = InMemory::new();
        backend
            .create(Record::new(
                "posts",
                RecordId::new("p1"),
                42,
                doc(json!({"title": "Saved", "_order": "V"})),
            ))
            .await
            .unwrap();
        backend
            .create(Record::new("authors", RecordId::new("a1"), 43, Default::default()))
            .await
            .unwrap();
        backend.save_to_file(&path).await.unwrap();
    }
    assert!(path.exists());

    let loaded = InMemory::load_from_file(&path).await.unwrap();
    assert_eq!(loaded.len().await, 2);
    let post = loaded.get("posts", &RecordId::new("p1")).await.unwrap();
    assert_eq!(post.created_at, 42);
    assert_eq!(post.str_field("_order"), Some("V"));
    assert_eq!(loaded.collections().await.unwrap(), ["authors", "posts"]);
}

#[tokio::test]
async fn test_load_non_existent_file() {
    let dir = TempDir::new().unwrap();
    let backend = InMemory::load_from_file(dir.path().join("missing.json"))
        .await
        .unwrap();
    assert!(backend.is_empty().await);
    assert!(backend.query("posts", &Filter::All).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_load_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = InMemory::load_from_file(&path).await.unwrap_err();
    assert!(err.is_store_error());
}

#[tokio::test]
async fn test_load_rejects_future_version() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("future.json");
    std::fs::write(&path, r#"{"_v": 99, "collections": {}}"#).unwrap();

    assert!(InMemory::load_from_file(&path).await.is_err());
}
