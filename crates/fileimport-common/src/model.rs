//! Domain models shared by the import pipeline and the HTTP API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ImportError;

/// Processing state of a single file, stored verbatim in the metadata hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    InProgress,
    Completed,
    Failed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::InProgress => "IN_PROGRESS",
            FileStatus::Completed => "COMPLETED",
            FileStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileStatus {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(FileStatus::InProgress),
            "COMPLETED" => Ok(FileStatus::Completed),
            "FAILED" => Ok(FileStatus::Failed),
            other => Err(ImportError::illegal_argument(format!(
                "unknown file status '{other}'"
            ))),
        }
    }
}

/// One entry of the metadata hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({"fileName": "orders-2024-01-01.csv", "status": "COMPLETED"}))]
pub struct FileMetadata {
    /// Name of the file as listed on the FTP server
    pub file_name: String,
    /// Current processing status
    pub status: FileStatus,
}

impl FileMetadata {
    pub fn new(file_name: impl Into<String>, status: FileStatus) -> Self {
        Self {
            file_name: file_name.into(),
            status,
        }
    }
}

/// Summary of one import run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Files downloaded from the FTP server during this run
    pub fetched: usize,
    /// Files found in the staging directory and handed to the pipeline
    pub processed: usize,
    /// Files uploaded and marked COMPLETED
    pub completed: usize,
    /// Names of files marked FAILED
    pub failed: Vec<String>,
}

impl ImportReport {
    /// Report for a run that found nothing to do.
    pub fn empty(started_at: DateTime<Utc>, fetched: usize) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            fetched,
            processed: 0,
            completed: 0,
            failed: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
