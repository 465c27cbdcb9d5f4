//! File status endpoints.

use actix_web::{HttpResponse, get, web};
use fileimport_common::{FileMetadata, validate_file_name};
use tracing::debug;

use crate::error::AppError;
use crate::model::app_state::AppState;
use crate::model::response::{self as common, ErrorResult};

/// List the status of every known file
#[utoipa::path(
    get,
    path = "/api/v1/files/status",
    tag = "files",
    responses(
        (status = 200, description = "All file statuses, sorted by file name", body = [FileMetadata]),
        (status = 400, description = "Metadata store unavailable", body = ErrorResult)
    )
)]
#[get("/files/status")]
pub async fn list_statuses(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let statuses = data.metadata().list_statuses().await?;
    debug!(count = statuses.len(), "listed file statuses");
    Ok(common::Result::<Vec<FileMetadata>>::http_success(statuses))
}

/// Get the status of one file
#[utoipa::path(
    get,
    path = "/api/v1/files/{file_name}/status",
    tag = "files",
    params(
        ("file_name" = String, Path, description = "File name as listed on the FTP server")
    ),
    responses(
        (status = 200, description = "File status", body = FileMetadata),
        (status = 400, description = "Invalid file name or metadata store unavailable", body = ErrorResult),
        (status = 404, description = "File has never been processed", body = ErrorResult)
    )
)]
#[get("/files/{file_name}/status")]
pub async fn get_status(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let file_name = path.into_inner();
    validate_file_name(&file_name)?;

    let status = data.metadata().get_status(&file_name).await?;
    Ok(common::Result::<FileMetadata>::http_success(
        FileMetadata::new(file_name, status),
    ))
}
