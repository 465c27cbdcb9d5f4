//! Utility functions for the file import service

use crate::error::{ImportError, Result};

/// Longest file name accepted from FTP listings or API paths
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Validate a bare file name.
///
/// Names come from remote FTP listings and from request paths, and end up
/// joined onto the local staging directory, so anything that could escape
/// that directory is rejected.
///
/// # Examples
///
/// ```
/// use fileimport_common::validate_file_name;
///
/// assert!(validate_file_name("orders.csv").is_ok());
/// assert!(validate_file_name("../etc/passwd").is_err());
/// assert!(validate_file_name("").is_err());
/// ```
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ImportError::illegal_argument("file name must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(ImportError::illegal_argument(format!(
            "'{name}' is not a file name"
        )));
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return Err(ImportError::illegal_argument(format!(
            "file name '{name}' must not contain path separators"
        )));
    }
    if name.len() > MAX_FILE_NAME_LEN {
        return Err(ImportError::illegal_argument(format!(
            "file name exceeds {MAX_FILE_NAME_LEN} bytes"
        )));
    }
    Ok(())
}

/// Final path component of an FTP listing entry.
///
/// Some servers answer `NLST` with paths relative to the login directory
/// rather than bare names.
pub fn listing_base_name(entry: &str) -> &str {
    let trimmed = entry.trim_end_matches(['/', '\r', '\n']);
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
