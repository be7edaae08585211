//! Backend creation and utility functions.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use orderable::backend::{
    BackendImpl,
    database::{InMemory, Postgres, Sqlite},
};

use crate::cli::{Backend, BackendConfig};

const SQLITE_FILE: &str = "orderable.db";
const JSON_FILE: &str = "orderable.json";

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut redacted = parsed.clone();
        if !parsed.username().is_empty() {
            let _ = redacted.set_username("***");
        }
        if parsed.password().is_some() {
            let _ = redacted.set_password(Some("***"));
        }
        redacted.to_string()
    } else {
        "postgres://***@<unparsable-url>".to_string()
    }
}

fn data_dir(config: &BackendConfig) -> PathBuf {
    config.data_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

/// Path of the JSON file the in-memory backend persists to.
pub fn json_path(config: &BackendConfig) -> PathBuf {
    data_dir(config).join(JSON_FILE)
}

/// Human-readable description of the configured backend.
pub fn backend_label(config: &BackendConfig) -> String {
    match config.backend {
        Backend::Sqlite => format!("sqlite ({})", data_dir(config).join(SQLITE_FILE).display()),
        Backend::Postgres => match &config.postgres_url {
            Some(url) => format!("postgres ({})", redact_postgres_url(url)),
            None => "postgres".to_string(),
        },
        Backend::Inmemory => format!("inmemory ({})", json_path(config).display()),
    }
}

/// Create the appropriate backend based on configuration
pub async fn create_backend(
    config: &BackendConfig,
) -> Result<Arc<dyn BackendImpl>, Box<dyn std::error::Error>> {
    let data_dir = data_dir(config);

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir).await?;

    match config.backend {
        Backend::Sqlite => {
            let db_path = data_dir.join(SQLITE_FILE);
            tracing::info!("Using SQLite backend at {}", db_path.display());
            Ok(Arc::new(Sqlite::open(&db_path).await?))
        }
        Backend::Postgres => {
            let url = config
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL backend requires --postgres-url or ORDERABLE_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::info!("Connecting to PostgreSQL backend at {}", display_url);

            match Postgres::connect(url).await {
                Ok(backend) => {
                    tracing::info!("Connected to PostgreSQL successfully");
                    Ok(Arc::new(backend))
                }
                Err(e) => {
                    Err(format!("Failed to connect to PostgreSQL at {}: {}", display_url, e).into())
                }
            }
        }
        Backend::Inmemory => {
            let json_path = data_dir.join(JSON_FILE);
            tracing::info!(
                "Using in-memory backend with persistence at {}",
                json_path.display()
            );
            Ok(Arc::new(InMemory::load_from_file(&json_path).await?))
        }
    }
}

/// Write an in-memory backend back to its JSON file.
///
/// SQL backends persist every write themselves, so this is a no-op for them.
pub async fn persist(
    backend: &Arc<dyn BackendImpl>,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(in_memory) = backend.as_any().downcast_ref::<InMemory>() {
        in_memory.save_to_file(path).await?;
        tracing::info!("Saved in-memory data to {}", path.display());
    }
    Ok(())
}
