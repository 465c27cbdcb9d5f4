//! HTTP response types
//!
//! Successful calls return the [`Result`] envelope; failures return an
//! [`ErrorResult`].

use actix_web::{HttpResponse, HttpResponseBuilder, http::StatusCode};
use fileimport_common::error::SUCCESS;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic result wrapper for API responses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Result<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T> Result<T> {
    pub fn new(code: i32, message: String, data: T) -> Self {
        Result::<T> {
            code,
            message,
            data,
        }
    }

    pub fn success(data: T) -> Result<T> {
        Result::<T> {
            code: SUCCESS.code,
            message: SUCCESS.message.to_string(),
            data,
        }
    }

    pub fn http_success(data: impl Serialize) -> HttpResponse {
        HttpResponse::Ok().json(Result::success(data))
    }
}

/// Error body returned for every failed request
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "timestamp": "2024-01-01T10:00:00+00:00",
    "status": 502,
    "code": 31001,
    "message": "ftp error: failed to connect to ftp.example.com:21: connection refused",
    "details": "FTP Error"
}))]
pub struct ErrorResult {
    /// When the error was produced (RFC 3339)
    pub timestamp: String,
    /// HTTP status code
    pub status: u16,
    /// Application error code
    pub code: i32,
    pub message: String,
    /// Error class, e.g. "FTP Error" or "Redis Error"
    pub details: String,
}

impl ErrorResult {
    pub fn new(status: StatusCode, code: i32, message: String, details: &str) -> Self {
        ErrorResult {
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: status.as_u16(),
            code,
            message,
            details: details.to_string(),
        }
    }

    pub fn http_response(status: StatusCode, code: i32, message: String, details: &str) -> HttpResponse {
        HttpResponseBuilder::new(status).json(ErrorResult::new(status, code, message, details))
    }
}
