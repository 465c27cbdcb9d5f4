// HTTP error mapping for the file import API
// Wraps any error in an anyhow-backed AppError and maps ImportError variants to status codes

use std::fmt::{Display, Formatter};

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use fileimport_common::error::SERVER_ERROR;
use fileimport_common::{ErrorCode, ImportError};
use tracing::error;

use crate::model::response::ErrorResult;

// Local wrapper for application errors to implement actix-web error handling
// (Cannot impl foreign trait for foreign type due to orphan rules)
#[derive(Debug)]
pub struct AppError {
    inner: anyhow::Error,
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError { inner: value }
    }
}

impl From<ImportError> for AppError {
    fn from(value: ImportError) -> Self {
        AppError {
            inner: anyhow::Error::new(value),
        }
    }
}

impl AppError {
    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    pub fn downcast_ref<E: std::error::Error + Send + Sync + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Status, error code, and `details` label for this error.
    fn classify(&self) -> (StatusCode, ErrorCode<'static>, &'static str) {
        let Some(e) = self.downcast_ref::<ImportError>() else {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                SERVER_ERROR,
                "Internal Server Error",
            );
        };

        let (status, details) = match e {
            ImportError::Ftp(_) => (StatusCode::BAD_GATEWAY, "FTP Error"),
            ImportError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "MinIO Storage Error"),
            ImportError::Metadata(_) => (StatusCode::BAD_REQUEST, "Redis Error"),
            ImportError::MetadataNotFound(_) => (StatusCode::NOT_FOUND, "Redis Error"),
            ImportError::IllegalArgument(_) => (StatusCode::BAD_REQUEST, "Illegal Argument"),
            ImportError::RunInProgress => (StatusCode::CONFLICT, "Import In Progress"),
            ImportError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Configuration Error"),
            ImportError::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "I/O Error"),
            ImportError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error"),
        };
        (status, e.error_code(), details)
    }
}

impl actix_web::error::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.classify().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, code, details) = self.classify();
        if status.is_server_error() {
            error!(error = %self.inner, status = status.as_u16(), "request failed");
        }
        ErrorResult::http_response(status, code.code, self.inner.to_string(), details)
    }
}
