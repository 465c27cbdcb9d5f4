//! Typed configuration sections.
//!
//! Keys are kebab-case so `conf/application.yml` reads like the properties
//! file operators already know (`ftp.server.remote-directory`, `minio.bucket-name`).
//! Environment overrides such as `FILEIMPORT_MINIO__SECRET_KEY` are mapped onto
//! the same kebab-case keys before these sections are deserialized.
//! Every section derives [`Validate`]; the server refuses to start on the first
//! invalid section.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::DEFAULT_METADATA_KEY;

// ---------------------------------------------------------------------------
// ftp.server
// ---------------------------------------------------------------------------

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct FtpSettings {
    #[validate(length(min = 1, message = "ftp host must not be empty"))]
    pub host: String,
    #[serde(default = "default_ftp_port")]
    #[validate(range(min = 1))]
    pub port: u16,
    #[validate(length(min = 1))]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_remote_directory")]
    pub remote_directory: String,
    #[serde(default = "default_local_directory")]
    pub local_directory: PathBuf,
    /// Connect/read timeout for the control and data connections.
    #[serde(default = "default_ftp_timeout_secs")]
    #[validate(range(min = 1, max = 3600))]
    pub timeout_secs: u64,
}

// Credentials stay out of logs.
impl fmt::Debug for FtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("remote_directory", &self.remote_directory)
            .field("local_directory", &self.local_directory)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_ftp_port() -> u16 {
    21
}
fn default_remote_directory() -> String {
    "/".into()
}
fn default_local_directory() -> PathBuf {
    PathBuf::from("tmp/ftp")
}
fn default_ftp_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// minio
// ---------------------------------------------------------------------------

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct MinioSettings {
    #[validate(url)]
    pub endpoint: String,
    #[validate(length(min = 1))]
    pub access_key: String,
    #[validate(length(min = 1))]
    pub secret_key: String,
    #[validate(length(min = 3, max = 63, message = "bucket names are 3 to 63 characters"))]
    pub bucket_name: String,
    #[serde(default = "default_region")]
    pub region: String,
}

impl fmt::Debug for MinioSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinioSettings")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .finish()
    }
}

fn default_region() -> String {
    "us-east-1".into()
}

// ---------------------------------------------------------------------------
// redis / metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct RedisSettings {
    #[serde(default = "default_redis_url")]
    #[validate(length(min = 1))]
    pub url: String,
    #[serde(default = "default_metadata_key")]
    #[validate(length(min = 1))]
    pub metadata_key: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            metadata_key: default_metadata_key(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".into()
}
fn default_metadata_key() -> String {
    DEFAULT_METADATA_KEY.into()
}

/// Where file statuses are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataBackend {
    #[default]
    Redis,
    /// In-process map; statuses are lost on restart.
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct MetadataSettings {
    #[serde(default)]
    pub backend: MetadataBackend,
}

// ---------------------------------------------------------------------------
// task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct TaskSettings {
    /// Six-field cron expression (`sec min hour day-of-month month day-of-week`).
    #[serde(default = "default_cron")]
    #[validate(length(min = 1))]
    pub cron: String,
    /// Maximum number of files processed at the same time.
    #[serde(default = "default_concurrency")]
    #[validate(range(min = 1, max = 256))]
    pub concurrency: usize,
    /// Remove a staged file once it has been uploaded.
    #[serde(default)]
    pub delete_after_upload: bool,
    /// Whether the cron schedule runs at all; manual runs stay available.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            cron: default_cron(),
            concurrency: default_concurrency(),
            delete_after_upload: false,
            enabled: true,
        }
    }
}

fn default_cron() -> String {
    "0 */5 * * * *".into()
}
fn default_concurrency() -> usize {
    10
}
fn default_true() -> bool {
    true
}
