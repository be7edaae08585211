//! Persistence operations for the InMemory store
//!
//! This module handles serialization and file I/O for saving/loading
//! the in-memory store to/from JSON files.

use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;

use super::{CollectionMap, InMemory};
use crate::{Error, Result, backend::errors::BackendError, record::Record};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the persistence version during deserialization.
fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// On-disk layout: every record, grouped by collection.
#[derive(Serialize, Deserialize)]
struct SerializableStore {
    /// File format version for compatibility checking
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    #[serde(default)]
    collections: HashMap<String, Vec<Record>>,
}

/// Saves every record of the store to a file as JSON.
pub(crate) async fn save_to_file<P: AsRef<Path>>(store: &InMemory, path: P) -> Result<()> {
    let collections = store
        .collections
        .read()
        .await
        .iter()
        .map(|(name, records)| (name.clone(), records.values().cloned().collect()))
        .collect();

    let serializable = SerializableStore {
        version: PERSISTENCE_VERSION,
        collections,
    };

    let json = serde_json::to_string_pretty(&serializable)
        .map_err(|e| -> Error { BackendError::SerializationFailed { source: e }.into() })?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| -> Error { BackendError::FileIo { source: e }.into() })
}

/// Loads a store from a JSON file.
///
/// If the file does not exist, a new, empty `InMemory` store is returned.
pub(crate) async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<InMemory> {
    let json = match tokio::fs::read_to_string(path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(InMemory::new()),
        Err(e) => return Err(BackendError::FileIo { source: e }.into()),
    };

    let serializable: SerializableStore = serde_json::from_str(&json)
        .map_err(|e| -> Error { BackendError::DeserializationFailed { source: e }.into() })?;

    let collections = serializable
        .collections
        .into_iter()
        .map(|(name, records)| {
            let map: CollectionMap = records.into_iter().map(|r| (r.id.clone(), r)).collect();
            (name, map)
        })
        .collect();

    Ok(InMemory {
        collections: RwLock::new(collections),
    })
}
