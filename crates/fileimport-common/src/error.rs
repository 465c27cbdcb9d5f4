//! Error types and error codes for the file import service
//!
//! This module defines:
//! - `ImportError`: Application-specific error enum
//! - `ErrorCode`: Structured error codes for API responses

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error("ftp error: {0}")]
    Ftp(String),

    #[error("object storage error: {0}")]
    Storage(String),

    #[error("metadata store error: {0}")]
    Metadata(String),

    #[error("no metadata found for file: {0}")]
    MetadataNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("caused: {0}")]
    IllegalArgument(String),

    #[error("an import run is already in progress")]
    RunInProgress,

    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ImportError>;

impl ImportError {
    pub fn ftp(msg: impl Into<String>) -> Self {
        Self::Ftp(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn illegal_argument(msg: impl Into<String>) -> Self {
        Self::IllegalArgument(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Structured code reported to API clients for this error.
    pub fn error_code(&self) -> ErrorCode<'static> {
        match self {
            ImportError::Ftp(_) => FTP_ERROR,
            ImportError::Storage(_) => STORAGE_ERROR,
            ImportError::Metadata(_) => METADATA_ERROR,
            ImportError::MetadataNotFound(_) => RESOURCE_NOT_FOUND,
            ImportError::IllegalArgument(_) => PARAMETER_VALIDATE_ERROR,
            ImportError::RunInProgress => IMPORT_IN_PROGRESS,
            ImportError::Config(_) | ImportError::Io { .. } | ImportError::Internal(_) => {
                SERVER_ERROR
            }
        }
    }
}

/// Error code structure for API responses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode<'a> {
    pub code: i32,
    pub message: &'a str,
}

pub const SUCCESS: ErrorCode<'static> = ErrorCode {
    code: 0,
    message: "success",
};

pub const PARAMETER_VALIDATE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 20002,
    message: "parameter validate error",
};

pub const RESOURCE_NOT_FOUND: ErrorCode<'static> = ErrorCode {
    code: 20004,
    message: "resource not found",
};

pub const IMPORT_IN_PROGRESS: ErrorCode<'static> = ErrorCode {
    code: 20005,
    message: "import already in progress",
};

pub const SERVER_ERROR: ErrorCode<'static> = ErrorCode {
    code: 30000,
    message: "server error",
};

pub const FTP_ERROR: ErrorCode<'static> = ErrorCode {
    code: 31001,
    message: "ftp error",
};

pub const STORAGE_ERROR: ErrorCode<'static> = ErrorCode {
    code: 31002,
    message: "object storage error",
};

pub const METADATA_ERROR: ErrorCode<'static> = ErrorCode {
    code: 31003,
    message: "metadata store error",
};
