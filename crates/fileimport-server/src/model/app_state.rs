//! Shared state handed to every request handler.

use std::sync::Arc;

use fileimport_common::Result;
use fileimport_core::{
    FileProcessor, FtpSource, MetadataStore, ObjectUploader, build_metadata_store,
};
use tracing::info;

use super::config::Configuration;

pub struct AppState {
    processor: Arc<FileProcessor>,
}

impl AppState {
    pub fn new(processor: Arc<FileProcessor>) -> Self {
        Self { processor }
    }

    /// Wire the FTP source, object store, and metadata store from configuration.
    pub async fn from_configuration(configuration: &Configuration) -> Result<Self> {
        let ftp = configuration.ftp_settings()?;
        let minio = configuration.minio_settings()?;
        let redis = configuration.redis_settings()?;
        let metadata = configuration.metadata_settings()?;
        let task = configuration.task_settings()?;

        let uploader = ObjectUploader::from_settings(&minio)?;
        let store = build_metadata_store(&metadata, &redis).await?;
        let local_dir = ftp.local_directory.clone();

        info!(
            ftp_host = %ftp.host,
            bucket = %minio.bucket_name,
            metadata_backend = store.backend(),
            local_dir = %local_dir.display(),
            "import pipeline configured"
        );

        let processor = FileProcessor::new(
            Arc::new(FtpSource::new(ftp)),
            uploader,
            store,
            local_dir,
            task,
        );
        Ok(Self::new(Arc::new(processor)))
    }

    pub fn processor(&self) -> &Arc<FileProcessor> {
        &self.processor
    }

    pub fn metadata(&self) -> &Arc<dyn MetadataStore> {
        self.processor.metadata()
    }

    pub fn uploader(&self) -> &ObjectUploader {
        self.processor.uploader()
    }
}
