use actix_web::{HttpResponse, Responder, Scope, get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::app_state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub metadata: ComponentStatus,
    pub storage: ComponentStatus,
    pub import_running: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    pub fn up() -> Self {
        Self {
            status: "UP".to_string(),
            message: None,
        }
    }

    pub fn down(message: String) -> Self {
        Self {
            status: "DOWN".to_string(),
            message: Some(message),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == "UP"
    }
}

/// Process is alive
#[utoipa::path(
    get,
    path = "/health/liveness",
    tag = "health",
    responses((status = 200, description = "Service is alive", body = ComponentStatus))
)]
#[get("/liveness")]
pub async fn liveness() -> web::Json<ComponentStatus> {
    web::Json(ComponentStatus::up())
}

/// Metadata store and object store are reachable
#[utoipa::path(
    get,
    path = "/health/readiness",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = HealthStatus),
        (status = 503, description = "A backing service is down", body = HealthStatus)
    )
)]
#[get("/readiness")]
pub async fn readiness(data: web::Data<AppState>) -> impl Responder {
    let (metadata, storage) = tokio::join!(data.metadata().ping(), data.uploader().health_check());

    let metadata = match metadata {
        Ok(()) => ComponentStatus::up(),
        Err(e) => ComponentStatus::down(e.to_string()),
    };
    let storage = match storage {
        Ok(()) => ComponentStatus::up(),
        Err(e) => ComponentStatus::down(e.to_string()),
    };

    let ready = metadata.is_up() && storage.is_up();
    let health_status = HealthStatus {
        status: if ready { "UP" } else { "DOWN" }.to_string(),
        metadata,
        storage,
        import_running: data.processor().is_running(),
    };

    if ready {
        HttpResponse::Ok().json(health_status)
    } else {
        HttpResponse::ServiceUnavailable().json(health_status)
    }
}

pub fn routes() -> Scope {
    web::scope("/health").service(liveness).service(readiness)
}
