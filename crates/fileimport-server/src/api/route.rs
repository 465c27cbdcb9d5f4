use actix_web::{Scope, web};

use super::{files, imports};

/// Versioned REST API.
pub fn routes() -> Scope {
    web::scope("/api/v1")
        .service(files::list_statuses)
        .service(files::get_status)
        .service(imports::trigger_import)
        .service(imports::last_report)
}
