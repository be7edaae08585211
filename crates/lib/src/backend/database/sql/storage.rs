//! Record storage operations for SQL backends.
//!
//! This module implements the record CRUD operations and atomic batches
//! using sqlx.

use serde_json::Value;

use crate::Result;
use crate::backend::WriteOp;
use crate::backend::errors::BackendError;
use crate::record::{Filter, Record, RecordId};

use super::{SqlxBackend, SqlxResultExt};

/// Rebuild a record from its stored columns.
fn decode(collection: &str, id: RecordId, created_at: i64, json: &str) -> Result<Record> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| BackendError::DeserializationFailed { source: e })?;
    let Value::Object(data) = value else {
        return Err(BackendError::CorruptRecord {
            collection: collection.to_string(),
            id,
            reason: "record body is not a JSON object".to_string(),
        }
        .into());
    };
    Ok(Record::new(collection, id, created_at as u64, data))
}

fn encode(record: &Record) -> Result<String> {
    serde_json::to_string(&record.data)
        .map_err(|e| BackendError::SerializationFailed { source: e }.into())
}

/// Get a record by id.
pub async fn get(backend: &SqlxBackend, collection: &str, id: &RecordId) -> Result<Record> {
    let row: Option<(i64, String)> = sqlx::query_as(
        "SELECT created_at, data_json FROM records WHERE collection = $1 AND id = $2",
    )
    .bind(collection.to_string())
    .bind(id.to_string())
    .fetch_optional(backend.pool())
    .await
    .sql_context("Failed to get record")?;

    match row {
        Some((created_at, json)) => decode(collection, id.clone(), created_at, &json),
        None => Err(BackendError::RecordNotFound {
            collection: collection.to_string(),
            id: id.clone(),
        }
        .into()),
    }
}

/// Load a collection and keep the records matching the filter.
pub async fn query(backend: &SqlxBackend, collection: &str, filter: &Filter) -> Result<Vec<Record>> {
    let rows: Vec<(String, i64, String)> =
        sqlx::query_as("SELECT id, created_at, data_json FROM records WHERE collection = $1")
            .bind(collection.to_string())
            .fetch_all(backend.pool())
            .await
            .sql_context("Failed to query records")?;

    let mut records = Vec::with_capacity(rows.len());
    for (id, created_at, json) in rows {
        let record = decode(collection, RecordId::from(id), created_at, &json)?;
        if filter.matches(&record) {
            records.push(record);
        }
    }
    Ok(records)
}

/// Apply every write inside one SQL transaction.
///
/// Returning early drops the transaction, which rolls it back.
pub async fn apply_batch(backend: &SqlxBackend, ops: Vec<WriteOp>) -> Result<()> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin batch")?;

    for op in ops {
        match op {
            WriteOp::Create(record) => {
                let existing: Option<(i64,)> = sqlx::query_as(
                    "SELECT created_at FROM records WHERE collection = $1 AND id = $2",
                )
                .bind(record.collection.clone())
                .bind(record.id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .sql_context("Failed to check record existence")?;
                if existing.is_some() {
                    return Err(BackendError::RecordAlreadyExists {
                        collection: record.collection,
                        id: record.id,
                    }
                    .into());
                }

                let json = encode(&record)?;
                sqlx::query(
                    "INSERT INTO records (collection, id, created_at, data_json)
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(record.collection.clone())
                .bind(record.id.to_string())
                .bind(record.created_at as i64)
                .bind(json)
                .execute(&mut *tx)
                .await
                .sql_context("Failed to insert record")?;
            }
            WriteOp::Update {
                collection,
                id,
                patch,
            } => {
                let row: Option<(i64, String)> = sqlx::query_as(
                    "SELECT created_at, data_json FROM records WHERE collection = $1 AND id = $2",
                )
                .bind(collection.clone())
                .bind(id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .sql_context("Failed to load record for update")?;
                let Some((created_at, json)) = row else {
                    return Err(BackendError::RecordNotFound { collection, id }.into());
                };

                let mut record = decode(&collection, id, created_at, &json)?;
                record.apply_patch(&patch);
                let json = encode(&record)?;
                sqlx::query("UPDATE records SET data_json = $1 WHERE collection = $2 AND id = $3")
                    .bind(json)
                    .bind(collection)
                    .bind(record.id.to_string())
                    .execute(&mut *tx)
                    .await
                    .sql_context("Failed to update record")?;
            }
        }
    }

    tx.commit().await.sql_context("Failed to commit batch")
}

/// Delete the records of a collection matching the filter.
pub async fn delete(backend: &SqlxBackend, collection: &str, filter: &Filter) -> Result<usize> {
    let doomed = query(backend, collection, filter).await?;
    if doomed.is_empty() {
        return Ok(0);
    }

    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin delete")?;
    for record in &doomed {
        sqlx::query("DELETE FROM records WHERE collection = $1 AND id = $2")
            .bind(collection.to_string())
            .bind(record.id.to_string())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete record")?;
    }
    tx.commit().await.sql_context("Failed to commit delete")?;

    Ok(doomed.len())
}

/// List collections that hold at least one record.
pub async fn collections(backend: &SqlxBackend) -> Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT collection FROM records ORDER BY collection")
            .fetch_all(backend.pool())
            .await
            .sql_context("Failed to list collections")?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}
