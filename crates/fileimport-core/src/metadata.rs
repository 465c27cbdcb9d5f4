//! Per-file processing status.
//!
//! Every file gets one field in a single hash (`file:metadata` by default);
//! the value is the status string. The Redis store is the production backend,
//! the in-memory store serves local runs and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use fileimport_common::settings::{MetadataBackend, MetadataSettings, RedisSettings};
use fileimport_common::{FileMetadata, FileStatus, ImportError, Result};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{error, info, warn};

/// Storage for file statuses
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Backend name for logs and health output.
    fn backend(&self) -> &'static str;

    async fn save_status(&self, file_name: &str, status: FileStatus) -> Result<()>;

    /// Fails with [`ImportError::MetadataNotFound`] when the file was never seen.
    async fn get_status(&self, file_name: &str) -> Result<FileStatus>;

    /// All known files, sorted by name.
    async fn list_statuses(&self) -> Result<Vec<FileMetadata>>;

    async fn ping(&self) -> Result<()>;
}

/// Create the configured backend.
pub async fn build_metadata_store(
    metadata: &MetadataSettings,
    redis: &RedisSettings,
) -> Result<Arc<dyn MetadataStore>> {
    match metadata.backend {
        MetadataBackend::Redis => Ok(Arc::new(RedisMetadataStore::connect(redis).await?)),
        MetadataBackend::Memory => {
            warn!("using in-memory metadata store, statuses are lost on restart");
            Ok(Arc::new(MemoryMetadataStore::new()))
        }
    }
}

/// Turn raw hash entries into sorted metadata, dropping values that are not
/// a known status.
fn decode_entries(entries: HashMap<String, String>) -> Vec<FileMetadata> {
    let mut result: Vec<FileMetadata> = entries
        .into_iter()
        .filter_map(|(file_name, raw)| match raw.parse::<FileStatus>() {
            Ok(status) => Some(FileMetadata { file_name, status }),
            Err(_) => {
                warn!(file = %file_name, value = %raw, "ignoring unknown status value");
                None
            }
        })
        .collect();
    result.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    result
}

// ============================================================================
// Redis
// ============================================================================

/// Statuses kept in a Redis hash
#[derive(Clone)]
pub struct RedisMetadataStore {
    conn: ConnectionManager,
    key: String,
}

impl RedisMetadataStore {
    /// Connect with an auto-reconnecting multiplexed connection.
    pub async fn connect(settings: &RedisSettings) -> Result<Self> {
        let client = redis::Client::open(settings.url.as_str())
            .map_err(|e| ImportError::metadata(format!("invalid redis url: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| ImportError::metadata(format!("failed to connect to redis: {e}")))?;

        info!(key = %settings.metadata_key, "connected to redis");
        Ok(Self {
            conn,
            key: settings.metadata_key.clone(),
        })
    }
}

#[async_trait]
impl MetadataStore for RedisMetadataStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn save_status(&self, file_name: &str, status: FileStatus) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(&self.key, file_name, status.as_str())
            .await
            .map_err(|e| {
                error!(file = %file_name, error = %e, "failed to save file metadata in redis");
                ImportError::metadata(format!(
                    "failed to save file metadata in redis for file: {file_name}: {e}"
                ))
            })?;
        info!(file = %file_name, %status, "saved metadata");
        Ok(())
    }

    async fn get_status(&self, file_name: &str) -> Result<FileStatus> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.hget(&self.key, file_name).await.map_err(|e| {
            error!(file = %file_name, error = %e, "failed to read file metadata from redis");
            ImportError::metadata(format!(
                "failed to retrieve file metadata from redis for file: {file_name}: {e}"
            ))
        })?;

        let raw = value.ok_or_else(|| ImportError::MetadataNotFound(file_name.to_string()))?;
        raw.parse::<FileStatus>()
            .map_err(|_| ImportError::metadata(format!("corrupt status '{raw}' for {file_name}")))
    }

    async fn list_statuses(&self) -> Result<Vec<FileMetadata>> {
        let mut conn = self.conn.clone();
        let entries: HashMap<String, String> = conn
            .hgetall(&self.key)
            .await
            .map_err(|e| ImportError::metadata(format!("failed to list file metadata: {e}")))?;
        Ok(decode_entries(entries))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ImportError::metadata(e.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Statuses kept in process memory
#[derive(Debug, Default, Clone)]
pub struct MemoryMetadataStore {
    entries: Arc<DashMap<String, FileStatus>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn save_status(&self, file_name: &str, status: FileStatus) -> Result<()> {
        self.entries.insert(file_name.to_string(), status);
        info!(file = %file_name, %status, "saved metadata");
        Ok(())
    }

    async fn get_status(&self, file_name: &str) -> Result<FileStatus> {
        self.entries
            .get(file_name)
            .map(|entry| *entry.value())
            .ok_or_else(|| ImportError::MetadataNotFound(file_name.to_string()))
    }

    async fn list_statuses(&self) -> Result<Vec<FileMetadata>> {
        let mut result: Vec<FileMetadata> = self
            .entries
            .iter()
            .map(|entry| FileMetadata::new(entry.key().clone(), *entry.value()))
            .collect();
        result.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(result)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
