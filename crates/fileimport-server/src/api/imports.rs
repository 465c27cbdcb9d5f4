//! Manual import trigger and run reports.

use actix_web::{HttpResponse, get, http::StatusCode, post, web};
use fileimport_common::error::RESOURCE_NOT_FOUND;
use fileimport_common::{ImportError, ImportReport};
use tracing::info;

use crate::error::AppError;
use crate::model::app_state::AppState;
use crate::model::response::{self as common, ErrorResult};

/// Run an import now and wait for it to finish
///
/// The run is spawned onto the runtime, so a client that disconnects does not
/// cancel it half way.
#[utoipa::path(
    post,
    path = "/api/v1/imports",
    tag = "imports",
    responses(
        (status = 200, description = "Run finished; per-file failures are listed in the report", body = ImportReport),
        (status = 409, description = "Another run is in progress", body = ErrorResult),
        (status = 502, description = "FTP server unreachable", body = ErrorResult)
    )
)]
#[post("/imports")]
pub async fn trigger_import(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    info!("manual import requested");
    let processor = data.processor().clone();
    let report = tokio::spawn(async move { processor.process_files().await })
        .await
        .map_err(|e| ImportError::Internal(format!("import task failed: {e}")))??;
    Ok(common::Result::<ImportReport>::http_success(report))
}

/// Report of the most recent run
#[utoipa::path(
    get,
    path = "/api/v1/imports/last",
    tag = "imports",
    responses(
        (status = 200, description = "Most recent import report", body = ImportReport),
        (status = 404, description = "No import has finished yet", body = ErrorResult)
    )
)]
#[get("/imports/last")]
pub async fn last_report(data: web::Data<AppState>) -> HttpResponse {
    match data.processor().last_report().await {
        Some(report) => common::Result::<ImportReport>::http_success(report),
        None => ErrorResult::http_response(
            StatusCode::NOT_FOUND,
            RESOURCE_NOT_FOUND.code,
            "no import has finished yet".to_string(),
            "Not Found",
        ),
    }
}
