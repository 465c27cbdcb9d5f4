//! Import pipeline: fetch, stage, upload, record.
//!
//! One run fetches from the source, then walks the staging directory and
//! pushes every regular file through `IN_PROGRESS → upload → COMPLETED`,
//! with at most `task.concurrency` files in flight. A failing file is marked
//! `FAILED` and never stops the others. Runs never overlap.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use fileimport_common::settings::TaskSettings;
use fileimport_common::{FileStatus, ImportError, ImportReport, Result, validate_file_name};
use futures::stream::{self, StreamExt};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use crate::metadata::MetadataStore;
use crate::source::FileSource;
use crate::storage::ObjectUploader;

pub struct FileProcessor {
    source: Arc<dyn FileSource>,
    uploader: ObjectUploader,
    metadata: Arc<dyn MetadataStore>,
    local_dir: PathBuf,
    settings: TaskSettings,
    run_lock: Mutex<()>,
    last_report: RwLock<Option<ImportReport>>,
}

impl FileProcessor {
    pub fn new(
        source: Arc<dyn FileSource>,
        uploader: ObjectUploader,
        metadata: Arc<dyn MetadataStore>,
        local_dir: impl Into<PathBuf>,
        settings: TaskSettings,
    ) -> Self {
        Self {
            source,
            uploader,
            metadata,
            local_dir: local_dir.into(),
            settings,
            run_lock: Mutex::new(()),
            last_report: RwLock::new(None),
        }
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    pub fn uploader(&self) -> &ObjectUploader {
        &self.uploader
    }

    pub fn settings(&self) -> &TaskSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    pub async fn last_report(&self) -> Option<ImportReport> {
        self.last_report.read().await.clone()
    }

    /// Run one import.
    ///
    /// Fails with [`ImportError::RunInProgress`] when another run holds the
    /// lock, and with the source's error when fetching fails. Per-file
    /// failures are reported in [`ImportReport::failed`], not returned.
    #[instrument(skip_all, fields(source = self.source.name(), local_dir = %self.local_dir.display()))]
    pub async fn process_files(&self) -> Result<ImportReport> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| ImportError::RunInProgress)?;
        let started_at = Utc::now();

        let fetch = self.source.fetch_files(&self.local_dir).await?;
        if !fetch.failed.is_empty() {
            warn!(failed = fetch.failed.len(), "some files could not be fetched");
        }

        let files = list_staged_files(&self.local_dir).await?;
        if files.is_empty() {
            info!("no files found to process");
            let report = ImportReport::empty(started_at, fetch.downloaded.len());
            *self.last_report.write().await = Some(report.clone());
            return Ok(report);
        }

        let processed = files.len();
        info!(files = processed, concurrency = self.settings.concurrency, "processing staged files");

        let outcomes: Vec<(String, Result<()>)> = stream::iter(files)
            .map(|(name, path)| async move {
                let outcome = self.process_file(&name, &path).await;
                (name, outcome)
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut failed: Vec<String> = outcomes
            .into_iter()
            .filter_map(|(name, outcome)| outcome.err().map(|_| name))
            .collect();
        failed.sort();

        let report = ImportReport {
            started_at,
            finished_at: Utc::now(),
            fetched: fetch.downloaded.len(),
            processed,
            completed: processed - failed.len(),
            failed,
        };
        info!(
            completed = report.completed,
            failed = report.failed.len(),
            "import run finished"
        );
        *self.last_report.write().await = Some(report.clone());
        Ok(report)
    }

    async fn process_file(&self, name: &str, path: &Path) -> Result<()> {
        let result = self.upload_and_record(name, path).await;

        match &result {
            Ok(()) => {
                if self.settings.delete_after_upload {
                    if let Err(e) = tokio::fs::remove_file(path).await {
                        warn!(file = %name, error = %e, "failed to remove staged file");
                    }
                }
            }
            Err(e) => {
                error!(file = %name, error = %e, "error during processing of file");
                if let Err(mark_err) = self.metadata.save_status(name, FileStatus::Failed).await {
                    error!(file = %name, error = %mark_err, "failed to mark file as FAILED");
                }
            }
        }
        result
    }

    async fn upload_and_record(&self, name: &str, path: &Path) -> Result<()> {
        self.metadata.save_status(name, FileStatus::InProgress).await?;
        self.uploader.upload_file(path).await?;
        self.metadata.save_status(name, FileStatus::Completed).await
    }
}

/// Regular files directly under `dir`, sorted by name.
async fn list_staged_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ImportError::io(dir, e)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ImportError::io(dir, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| ImportError::io(entry.path(), e))?;
        if !file_type.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            debug!(path = %entry.path().display(), "skipping non UTF-8 file name");
            continue;
        };
        if validate_file_name(&name).is_err() {
            continue;
        }
        files.push((name, entry.path()));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}
