//! File Import Core - the import pipeline
//!
//! - [`source`]: where files come from (FTP)
//! - [`storage`]: where files go (S3-compatible object store)
//! - [`metadata`]: per-file processing status (Redis hash)
//! - [`processor`]: fetch, upload, and record, with bounded concurrency
//! - [`scheduler`]: cron-driven runs of the processor

pub mod metadata;
pub mod processor;
pub mod scheduler;
pub mod source;
pub mod storage;

pub use metadata::{MemoryMetadataStore, MetadataStore, RedisMetadataStore, build_metadata_store};
pub use processor::FileProcessor;
pub use scheduler::{CronSchedule, run_scheduler};
pub use source::{FetchReport, FileSource, FtpSource};
pub use storage::{ObjectUploader, UploadedObject};
