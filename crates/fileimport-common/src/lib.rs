//! File Import Common - Shared types, settings, and utilities
//!
//! This crate provides the foundational types used across all file import components:
//! - Error types and error codes
//! - Domain models (file status, import reports)
//! - Typed configuration sections
//! - Utility functions

pub mod error;
pub mod model;
pub mod settings;
pub mod utils;

// Re-exports for convenience
pub use error::{ErrorCode, ImportError, Result};
pub use model::{FileMetadata, FileStatus, ImportReport};
pub use utils::{listing_base_name, validate_file_name};

/// Redis hash holding one field per imported file
pub const DEFAULT_METADATA_KEY: &str = "file:metadata";
