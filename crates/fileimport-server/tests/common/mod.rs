//! Common test utilities for API integration tests
//!
//! Builds an [`AppState`] over in-memory backends:
//! - object store: `object_store::memory::InMemory`
//! - metadata: `MemoryMetadataStore`, or a store whose backend is down
//! - source: stubs that stage files locally instead of talking FTP

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use fileimport_common::settings::TaskSettings;
use fileimport_common::{FileMetadata, FileStatus, ImportError, Result};
use fileimport_core::{
    FetchReport, FileProcessor, FileSource, MemoryMetadataStore, MetadataStore, ObjectUploader,
};
use fileimport_server::AppState;
use object_store::memory::InMemory;
use tempfile::TempDir;
use tokio::sync::Notify;

pub const TEST_BUCKET: &str = "imports";

/// Writes fixed files into the staging directory on every fetch
pub struct StagingSource {
    files: Vec<(&'static str, &'static str)>,
}

impl StagingSource {
    pub fn new(files: Vec<(&'static str, &'static str)>) -> Self {
        Self { files }
    }
}

#[async_trait]
impl FileSource for StagingSource {
    fn name(&self) -> &str {
        "staging"
    }

    async fn fetch_files(&self, local_dir: &Path) -> Result<FetchReport> {
        stage(local_dir, &self.files).await
    }
}

async fn stage(local_dir: &Path, files: &[(&'static str, &'static str)]) -> Result<FetchReport> {
    tokio::fs::create_dir_all(local_dir)
        .await
        .map_err(|e| ImportError::io(local_dir, e))?;
    let mut report = FetchReport::default();
    for (name, body) in files {
        let path = local_dir.join(name);
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| ImportError::io(&path, e))?;
        report.downloaded.push(name.to_string());
    }
    Ok(report)
}

/// Source whose server is unreachable
pub struct UnreachableSource;

#[async_trait]
impl FileSource for UnreachableSource {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn fetch_files(&self, _local_dir: &Path) -> Result<FetchReport> {
        Err(ImportError::ftp(
            "failed to connect to ftp.example.com:21: connection refused",
        ))
    }
}

/// Source that blocks inside `fetch_files` until released, then stages its files
pub struct GatedSource {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
    files: Vec<(&'static str, &'static str)>,
}

impl GatedSource {
    pub fn new() -> Self {
        Self::with_files(vec![])
    }

    pub fn with_files(files: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
            files,
        }
    }
}

#[async_trait]
impl FileSource for GatedSource {
    fn name(&self) -> &str {
        "gated"
    }

    async fn fetch_files(&self, local_dir: &Path) -> Result<FetchReport> {
        self.started.notify_one();
        self.release.notified().await;
        stage(local_dir, &self.files).await
    }
}

/// Metadata store whose backend is down
pub struct DownMetadataStore;

#[async_trait]
impl MetadataStore for DownMetadataStore {
    fn backend(&self) -> &'static str {
        "down"
    }

    async fn save_status(&self, file_name: &str, _status: FileStatus) -> Result<()> {
        Err(ImportError::metadata(format!(
            "failed to save file metadata in redis for file: {file_name}: connection refused"
        )))
    }

    async fn get_status(&self, file_name: &str) -> Result<FileStatus> {
        Err(ImportError::metadata(format!(
            "failed to retrieve file metadata from redis for file: {file_name}: connection refused"
        )))
    }

    async fn list_statuses(&self) -> Result<Vec<FileMetadata>> {
        Err(ImportError::metadata("connection refused"))
    }

    async fn ping(&self) -> Result<()> {
        Err(ImportError::metadata("connection refused"))
    }
}

/// Application state plus handles on its fakes
pub struct TestContext {
    pub state: Arc<AppState>,
    pub store: Arc<InMemory>,
    pub staging: TempDir,
}

pub fn context(source: Arc<dyn FileSource>) -> TestContext {
    context_with_metadata(source, Arc::new(MemoryMetadataStore::new()))
}

pub fn context_with_metadata(
    source: Arc<dyn FileSource>,
    metadata: Arc<dyn MetadataStore>,
) -> TestContext {
    let staging = tempfile::tempdir().unwrap();
    let store = Arc::new(InMemory::new());
    let processor = FileProcessor::new(
        source,
        ObjectUploader::new(store.clone(), TEST_BUCKET),
        metadata,
        staging.path(),
        TaskSettings::default(),
    );

    TestContext {
        state: Arc::new(AppState::new(Arc::new(processor))),
        store,
        staging,
    }
}
