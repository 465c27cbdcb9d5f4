//! OpenAPI documentation for the file import API
//!
//! Served at `/api-docs/openapi.json` with Swagger UI under `/swagger-ui/`.

use fileimport_common::{FileMetadata, FileStatus, ImportReport};
use utoipa::OpenApi;

use super::health::{ComponentStatus, HealthStatus};
use crate::model::response::ErrorResult;

/// Main OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "OSS File Processing API",
        version = "1.0.0",
        description = "API documentation for OSS processing files",
        license(name = "Apache 2.0", url = "http://springdoc.org"),
        contact(
            name = "Chanchal Chakraborty",
            email = "chanchalchakrabortykol@gmail.com"
        )
    ),
    tags(
        (name = "files", description = "Per-file processing status"),
        (name = "imports", description = "Import runs"),
        (name = "health", description = "Health check APIs")
    ),
    paths(
        crate::api::files::list_statuses,
        crate::api::files::get_status,
        crate::api::imports::trigger_import,
        crate::api::imports::last_report,
        crate::api::health::liveness,
        crate::api::health::readiness,
    ),
    components(
        schemas(
            FileMetadata,
            FileStatus,
            ImportReport,
            ErrorResult,
            HealthStatus,
            ComponentStatus,
        )
    )
)]
pub struct ApiDoc;

/// Configure Swagger UI for the actix-web app
#[cfg(feature = "swagger")]
pub fn configure_swagger(cfg: &mut actix_web::web::ServiceConfig) {
    use utoipa_swagger_ui::SwaggerUi;

    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}

/// Configure Swagger UI for the actix-web app (no-op when swagger feature is disabled)
#[cfg(not(feature = "swagger"))]
pub fn configure_swagger(_cfg: &mut actix_web::web::ServiceConfig) {}
