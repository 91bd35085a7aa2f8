//! API integration tests
//!
//! Exercise the full router: auth, role gates, report JSON and downloads.

use axum::{
    body::{Body, Bytes},
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

use collections_backoffice::ExportCapabilities;

mod common;

use common::{ADMIN_KEY, COORDINATOR_KEY, INACTIVE_USER_KEY, OFFICER_KEY};

async fn send(app: &Router, method: &str, uri: &str, api_key: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("X-API-Key", key);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn json_body(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
#[ignore = "needs DATABASE_URL; run with cargo test -- --ignored"]
async fn test_health_needs_no_key() {
    let db = common::setup_test_db().await;
    let app = common::app(db.pool.clone(), ExportCapabilities::detect(true));

    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL; run with cargo test -- --ignored"]
async fn test_role_gates() {
    let db = common::setup_test_db().await;
    let app = common::app(db.pool.clone(), ExportCapabilities::detect(true));

    // Anonymous is denied, not redirected
    let response = send(&app, "GET", "/api/v1/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error_code"], "forbidden");

    // Coordinator may not touch master data
    let response = send(&app, "GET", "/api/v1/master-data/officers", Some(COORDINATOR_KEY)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Field officer may not read reports
    let response = send(&app, "GET", "/api/v1/reports/officer", Some(OFFICER_KEY)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin passes every gate
    for uri in [
        "/api/v1/master-data/officers",
        "/api/v1/reports/officer",
        "/api/v1/dashboard",
        "/api/v1/anomaly/daily-reports",
    ] {
        let response = send(&app, "GET", uri, Some(ADMIN_KEY)).await;
        assert_eq!(response.status(), StatusCode::OK, "admin denied on {}", uri);
    }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL; run with cargo test -- --ignored"]
async fn test_unusable_keys_are_unauthorized() {
    let db = common::setup_test_db().await;
    let app = common::app(db.pool.clone(), ExportCapabilities::detect(true));

    let response = send(&app, "GET", "/api/v1/dashboard", Some("cbo_not_a_key")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error_code"], "invalid_api_key");

    let response = send(&app, "GET", "/api/v1/dashboard", Some(INACTIVE_USER_KEY)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error_code"], "user_inactive");
}

#[tokio::test]
#[ignore = "needs DATABASE_URL; run with cargo test -- --ignored"]
async fn test_aggregate_report_json() {
    let db = common::setup_test_db().await;
    let app = common::app(db.pool.clone(), ExportCapabilities::detect(true));

    let response = send(
        &app,
        "GET",
        "/api/v1/reports/officer?from=2024-02-01&to=2024-02-29",
        Some(COORDINATOR_KEY),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["report"], "officer_report");
    assert_eq!(body["headers"], serde_json::json!(["username", "count", "total"]));
    assert_eq!(body["rows"].as_array().unwrap().len(), 1);
    assert_eq!(body["rows"][0]["username"], "petugas_01");
    assert_eq!(body["rows"][0]["count"], 1);
    assert_eq!(body["rows"][0]["total"], "250.25");
    assert!(body["rows"][0].get("label").is_none());

    let response = send(&app, "GET", "/api/v1/reports/weekly", Some(COORDINATOR_KEY)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        "GET",
        "/api/v1/reports/officer?from=2024-03-01&to=2024-01-01",
        Some(COORDINATOR_KEY),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL; run with cargo test -- --ignored"]
async fn test_spreadsheet_download() {
    let db = common::setup_test_db().await;
    let app = common::app(db.pool.clone(), ExportCapabilities::spreadsheet_only());

    let response = send(
        &app,
        "GET",
        "/api/v1/reports/area/export/excel",
        Some(COORDINATOR_KEY),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );

    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"area_report_"));
    assert!(disposition.ends_with(".xlsx\""));

    let bytes = body_bytes(response).await;
    assert_eq!(&bytes[..2], b"PK");

    let recorded: Vec<(i64, String, String)> = sqlx::query_as(
        "SELECT user_id, report_type, file_path FROM report_exports ORDER BY id",
    )
    .fetch_all(&db.pool)
    .await
    .unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, 2);
    assert_eq!(recorded[0].1, "area_report");
    assert!(disposition.contains(&recorded[0].2));
}

#[tokio::test]
#[ignore = "needs DATABASE_URL; run with cargo test -- --ignored"]
async fn test_outstanding_export() {
    let db = common::setup_test_db().await;
    let app = common::app(db.pool.clone(), ExportCapabilities::spreadsheet_only());

    let response = send(
        &app,
        "GET",
        "/api/v1/reports/tunggakan/export/xlsx",
        Some(COORDINATOR_KEY),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.contains("filename=\"transactions_"));
}

#[tokio::test]
#[ignore = "needs DATABASE_URL; run with cargo test -- --ignored"]
async fn test_unsupported_format_redirects_with_warning() {
    let db = common::setup_test_db().await;
    let app = common::app(db.pool.clone(), ExportCapabilities::detect(true));

    let response = send(
        &app,
        "GET",
        "/api/v1/reports/officer/export/csv",
        Some(COORDINATOR_KEY),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/api/v1/reports/officer");
    assert_eq!(
        response.headers()["x-flash-warning"],
        "csv export not yet implemented"
    );

    let response = send(
        &app,
        "GET",
        "/api/v1/reports/officer/export/csv?from=2024-02-01&to=2024-02-29",
        Some(COORDINATOR_KEY),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/api/v1/reports/officer?from=2024-02-01&to=2024-02-29"
    );

    let exports: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM report_exports")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(exports, 0);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL; run with cargo test -- --ignored"]
async fn test_disabled_document_export_is_unavailable() {
    let db = common::setup_test_db().await;
    let app = common::app(db.pool.clone(), ExportCapabilities::spreadsheet_only());

    let response = send(
        &app,
        "GET",
        "/api/v1/reports/monthly/export/pdf",
        Some(COORDINATOR_KEY),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error_code"], "export_unavailable");
}

#[cfg(feature = "pdf")]
#[tokio::test]
#[ignore = "needs DATABASE_URL; run with cargo test -- --ignored"]
async fn test_document_download() {
    let db = common::setup_test_db().await;
    let app = common::app(db.pool.clone(), ExportCapabilities::detect(true));

    let response = send(
        &app,
        "GET",
        "/api/v1/reports/daily/export/pdf",
        Some(COORDINATOR_KEY),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");

    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
#[ignore = "needs DATABASE_URL; run with cargo test -- --ignored"]
async fn test_officer_toggle_and_imei_reset() {
    let db = common::setup_test_db().await;
    let app = common::app(db.pool.clone(), ExportCapabilities::detect(true));

    let response = send(&app, "POST", "/api/v1/master-data/officers/1/toggle", Some(ADMIN_KEY)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["active"], false);

    let response = send(&app, "POST", "/api/v1/master-data/officers/1/reset-imei", Some(ADMIN_KEY)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let imei: Option<String> = sqlx::query_scalar("SELECT imei FROM officers WHERE id = 1")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert!(imei.is_none());

    let response = send(&app, "POST", "/api/v1/master-data/officers/99/toggle", Some(ADMIN_KEY)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL; run with cargo test -- --ignored"]
async fn test_field_officer_listings() {
    let db = common::setup_test_db().await;
    let app = common::app(db.pool.clone(), ExportCapabilities::detect(true));

    let response = send(&app, "GET", "/api/v1/talangan/transactions", Some(OFFICER_KEY)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["status"], "approved");
    assert_eq!(body[0]["officer_name"], "petugas_01");

    let response = send(&app, "GET", "/api/v1/anomaly/master-data", Some(OFFICER_KEY)).await;
    assert_eq!(json_body(response).await[0]["code"], "METER_RUSAK");

    let response = send(&app, "GET", "/api/v1/dashboard", Some(OFFICER_KEY)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["total_transactions"], 3);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL; run with cargo test -- --ignored"]
async fn test_log_monitoring_reports() {
    let db = common::setup_test_db().await;
    let app = common::app(db.pool.clone(), ExportCapabilities::detect(true));

    let response = send(&app, "GET", "/api/v1/reports/wa-monitoring", Some(COORDINATOR_KEY)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["idpel"], "532100000002");
    assert_eq!(body[0]["status"], "failed");
    assert_eq!(body[1]["status"], "delivered");

    let response = send(&app, "GET", "/api/v1/reports/log-monitoring", Some(COORDINATOR_KEY)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["module_name"], "sync");
    assert_eq!(body[0]["username"], Value::Null);
    assert_eq!(body[1]["username"], "petugas_01");

    let response = send(&app, "GET", "/api/v1/reports/bluetooth-print", Some(COORDINATOR_KEY)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["idpel"], "532100000003");
    assert_eq!(body[0]["printed_by"], "petugas_02");
    assert_eq!(body[0]["total"], "75.00");
    assert_eq!(body[1]["transaction_id"], 1);

    let response = send(&app, "GET", "/api/v1/reports/wa-monitoring", Some(OFFICER_KEY)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL; run with cargo test -- --ignored"]
async fn test_customer_lookup() {
    let db = common::setup_test_db().await;
    let app = common::app(db.pool.clone(), ExportCapabilities::detect(true));

    let response = send(
        &app,
        "GET",
        "/api/v1/information/customer-lookup?idpel=532100000002",
        Some(OFFICER_KEY),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["idpel"], "532100000002");
    assert_eq!(body["transactions"].as_array().unwrap().len(), 1);
    assert_eq!(body["transactions"][0]["officer_name"], "petugas_01");
    assert_eq!(body["transactions"][0]["status"], "pending");

    sqlx::query("UPDATE transactions SET officer_id = NULL WHERE idpel = '532100000002'")
        .execute(&db.pool)
        .await
        .unwrap();
    let response = send(
        &app,
        "GET",
        "/api/v1/information/customer-lookup?idpel=532100000002",
        Some(OFFICER_KEY),
    )
    .await;
    assert_eq!(json_body(response).await["transactions"][0]["officer_name"], "N/A");

    let response = send(
        &app,
        "GET",
        "/api/v1/information/customer-lookup?idpel=999999999999",
        Some(OFFICER_KEY),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["transactions"], serde_json::json!([]));

    let response = send(&app, "GET", "/api/v1/information/customer-lookup", Some(OFFICER_KEY)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error_code"], "invalid_request");
}
