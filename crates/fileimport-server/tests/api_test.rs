// REST API tests against in-memory backends
//
// Every request goes through the same route configuration the server uses.

mod common;

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use fileimport_common::FileStatus;
use fileimport_server::startup::configure_routes;
use object_store::ObjectStore;
use object_store::path::Path as ObjectPath;
use serde_json::Value;

use common::{DownMetadataStore, GatedSource, StagingSource, UnreachableSource};

#[actix_web::test]
async fn test_liveness() {
    let ctx = common::context(Arc::new(StagingSource::new(vec![])));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    let req = test::TestRequest::get().uri("/health/liveness").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "UP");
    assert!(body.get("message").is_none());
}

#[actix_web::test]
async fn test_readiness_up() {
    let ctx = common::context(Arc::new(StagingSource::new(vec![])));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    let req = test::TestRequest::get().uri("/health/readiness").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "UP");
    assert_eq!(body["metadata"]["status"], "UP");
    assert_eq!(body["storage"]["status"], "UP");
    assert_eq!(body["importRunning"], false);
}

#[actix_web::test]
async fn test_readiness_down_when_metadata_unreachable() {
    let ctx = common::context_with_metadata(
        Arc::new(StagingSource::new(vec![])),
        Arc::new(DownMetadataStore),
    );
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    let req = test::TestRequest::get().uri("/health/readiness").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "DOWN");
    assert_eq!(body["metadata"]["status"], "DOWN");
    assert!(
        body["metadata"]["message"]
            .as_str()
            .unwrap()
            .contains("connection refused")
    );
    assert_eq!(body["storage"]["status"], "UP");
}

#[actix_web::test]
async fn test_list_statuses_empty() {
    let ctx = common::context(Arc::new(StagingSource::new(vec![])));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/files/status")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["message"], "success");
    assert_eq!(body["data"], serde_json::json!([]));
}

#[actix_web::test]
async fn test_import_then_query_statuses() {
    let ctx = common::context(Arc::new(StagingSource::new(vec![
        ("orders.csv", "id,amount\n1,10\n"),
        ("customers.csv", "id,name\n1,Ada\n"),
    ])));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    // Run an import
    let req = test::TestRequest::post().uri("/api/v1/imports").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["fetched"], 2);
    assert_eq!(body["data"]["processed"], 2);
    assert_eq!(body["data"]["completed"], 2);
    assert_eq!(body["data"]["failed"], serde_json::json!([]));

    // Both files are in the bucket
    let stored = ctx
        .store
        .get(&ObjectPath::from("orders.csv"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(&stored[..], b"id,amount\n1,10\n");

    // All statuses, sorted by name
    let req = test::TestRequest::get()
        .uri("/api/v1/files/status")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body["data"],
        serde_json::json!([
            {"fileName": "customers.csv", "status": "COMPLETED"},
            {"fileName": "orders.csv", "status": "COMPLETED"},
        ])
    );

    // One status
    let req = test::TestRequest::get()
        .uri("/api/v1/files/orders.csv/status")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["fileName"], "orders.csv");
    assert_eq!(body["data"]["status"], "COMPLETED");

    // Last report
    let req = test::TestRequest::get()
        .uri("/api/v1/imports/last")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["completed"], 2);
}

#[actix_web::test]
async fn test_status_of_unknown_file_is_not_found() {
    let ctx = common::context(Arc::new(StagingSource::new(vec![])));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/files/missing.csv/status")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["code"], 20004);
    assert_eq!(body["details"], "Redis Error");
    assert!(body["message"].as_str().unwrap().contains("missing.csv"));
}

#[actix_web::test]
async fn test_status_with_invalid_name_is_bad_request() {
    let ctx = common::context(Arc::new(StagingSource::new(vec![])));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    let long_name = "a".repeat(300);
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/files/{long_name}/status"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 20002);
}

#[actix_web::test]
async fn test_last_report_before_any_run() {
    let ctx = common::context(Arc::new(StagingSource::new(vec![])));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/imports/last")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_import_with_unreachable_ftp_is_bad_gateway() {
    let ctx = common::context(Arc::new(UnreachableSource));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/v1/imports").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["details"], "FTP Error");
    assert_eq!(body["code"], 31001);
    assert!(body["message"].as_str().unwrap().contains("connection refused"));
}

#[actix_web::test]
async fn test_metadata_outage_is_redis_error() {
    let ctx = common::context_with_metadata(
        Arc::new(StagingSource::new(vec![])),
        Arc::new(DownMetadataStore),
    );
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/files/status")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["details"], "Redis Error");
    assert_eq!(body["code"], 31003);
}

#[actix_web::test]
async fn test_import_marks_files_failed_when_metadata_down() {
    let ctx = common::context_with_metadata(
        Arc::new(StagingSource::new(vec![("a.csv", "a")])),
        Arc::new(DownMetadataStore),
    );
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    // Per-file failures are reported, not returned as an error
    let req = test::TestRequest::post().uri("/api/v1/imports").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["completed"], 0);
    assert_eq!(body["data"]["failed"], serde_json::json!(["a.csv"]));
}

#[actix_web::test]
async fn test_concurrent_import_is_conflict() {
    let source = GatedSource::new();
    let started = source.started.clone();
    let release = source.release.clone();
    let ctx = common::context(Arc::new(source));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    let processor = ctx.state.processor().clone();
    let running = tokio::spawn(async move { processor.process_files().await });
    started.notified().await;

    let req = test::TestRequest::post().uri("/api/v1/imports").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 20005);

    let req = test::TestRequest::get().uri("/health/readiness").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["importRunning"], true);

    release.notify_one();
    let report = running.await.unwrap().unwrap();
    assert_eq!(report.processed, 0);
    assert!(!ctx.state.processor().is_running());
}

#[actix_web::test]
async fn test_context_path() {
    let ctx = common::context(Arc::new(StagingSource::new(vec![])));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "/fileimport")),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/fileimport/health/liveness")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/fileimport/api/v1/files/status")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/health/liveness").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[cfg(feature = "swagger")]
#[actix_web::test]
async fn test_openapi_document_is_served() {
    let ctx = common::context(Arc::new(StagingSource::new(vec![])));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api-docs/openapi.json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["info"]["title"], "OSS File Processing API");
    assert!(body["paths"]["/api/v1/imports"].is_object());
}

#[actix_web::test]
async fn test_dropped_request_does_not_cancel_import() {
    let source = Arc::new(GatedSource::with_files(vec![("a.csv", "id\n1\n")]));
    let ctx = common::context(source.clone());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(ctx.state.clone()))
            .configure(|cfg| configure_routes(cfg, "")),
    )
    .await;

    {
        let req = test::TestRequest::post().uri("/api/v1/imports").to_request();
        let call = test::call_service(&app, req);
        tokio::pin!(call);
        tokio::select! {
            _ = &mut call => panic!("import finished before the source was released"),
            _ = source.started.notified() => {}
        }
        // The request future is dropped here, as on a client disconnect.
    }
    source.release.notify_one();

    let processor = ctx.state.processor().clone();
    let report = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(report) = processor.last_report().await {
                break report;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("import did not finish after the request was dropped");

    assert_eq!(report.completed, 1);
    assert_eq!(
        ctx.state.metadata().get_status("a.csv").await.unwrap(),
        FileStatus::Completed
    );
    assert!(
        ctx.store
            .head(&ObjectPath::from("a.csv"))
            .await
            .is_ok()
    );
}
