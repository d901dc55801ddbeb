//! End-to-end checks for the reporting middleware.
//!
//! Drives a small router with `tower::ServiceExt::oneshot`; alerts land in a
//! `MemorySink` so each test can inspect exactly what would have been sent.

use apiglue_core::{ApiResponse, Principal};
use apiglue_observability::{DontReport, ExceptionHandler, MemorySink};
use apiglue_web::extract::{Json, Path};
use apiglue_web::{AppError, ReportState, with_exception_reporting};
use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::http::{Method, Request, StatusCode};
use axum::routing::{get, post};
use futures::stream;
use serde_json::{Value, json};
use std::io;
use std::sync::Arc;
use tower::ServiceExt; // .oneshot()

// ── Helpers ───────────────────────────────────────────────────

async fn ok() -> ApiResponse {
    ApiResponse::success("fine")
}

async fn broken() -> Result<ApiResponse, AppError> {
    Err(AppError::internal(anyhow::anyhow!("ledger offline")))
}

async fn missing() -> Result<ApiResponse, AppError> {
    Err(AppError::not_found("No such order"))
}

async fn echo_then_fail(body: String) -> Result<ApiResponse, AppError> {
    Err(AppError::bad_request(format!("received {} bytes", body.len())))
}

async fn order(Path(id): Path<u32>) -> ApiResponse {
    ApiResponse::success(format!("order {id}"))
}

async fn create(Json(body): Json<Value>) -> ApiResponse {
    ApiResponse::success("created").with_data(body)
}

async fn explode() -> ApiResponse {
    panic!("inventory invariant broken");
}

fn app(sink: &MemorySink, filter: DontReport) -> Router {
    let handler = ExceptionHandler::new(Arc::new(sink.clone())).with_filter(filter);
    let router = Router::new()
        .route("/ok", get(ok))
        .route("/broken", post(broken))
        .route("/missing", get(missing))
        .route("/echo", post(echo_then_fail))
        .route("/orders/{id}", get(order))
        .route("/orders", post(create))
        .route("/explode", get(explode));
    with_exception_reporting(router, ReportState::new(handler, 64 * 1024))
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    let raw = body.to_string();
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("host", "api.test")
        .header("content-type", "application/json")
        .header("content-length", raw.len())
        .header("x-forwarded-for", "198.51.100.4")
        .body(Body::from(raw))
        .unwrap()
}

/// Body streamed in chunks with no `content-length`.
fn chunked_post(
    uri: &str,
    content_type: &str,
    chunks: Vec<Result<Bytes, io::Error>>,
) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from_stream(stream::iter(chunks)))
        .unwrap()
}

fn chunk(s: &'static str) -> Result<Bytes, io::Error> {
    Ok(Bytes::from_static(s.as_bytes()))
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn success_sends_no_alert() {
    let sink = MemorySink::new();
    let resp = app(&sink, DontReport::none()).oneshot(get_req("/ok")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"success": true, "message": "fine"}));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn handler_error_is_alerted_with_request_snapshot() {
    let sink = MemorySink::new();
    let body = json!({"order": 81, "api_access_type": "internal", "__tReqData": "x"});
    let resp = app(&sink, DontReport::none())
        .oneshot(json_post("/broken?page=2", body))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Internal Server Error");

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    let (message, payload) = &alerts[0];
    assert_eq!(message, "*Back-end* : ledger offline");
    assert_eq!(payload.request.url, "http://api.test/broken");
    assert_eq!(payload.request.from.ip, "198.51.100.4");
    assert_eq!(payload.request.system_access_type.as_deref(), Some("internal"));
    // internal caller without a principal still gets an (empty) login block
    assert_eq!(payload.login_info.as_ref().map(|m| m.len()), Some(0));

    let data = payload.request.data.as_ref().unwrap();
    assert_eq!(data["order"], 81);
    assert_eq!(data["page"], "2");
    assert!(!data.contains_key("api_access_type"));
    assert!(!data.contains_key("__tReqData"));
    assert!(payload.exception.file.ends_with("reporting.rs"));
}

#[tokio::test]
async fn principal_extension_is_redacted_into_login_info() {
    let sink = MemorySink::new();
    let principal = Principal::new(
        json!({"id": 5, "random_string": "s3cr3t"})
            .as_object()
            .cloned()
            .unwrap(),
    );
    let mut req = json_post("/broken", json!({"api_access_type": "internal"}));
    req.extensions_mut().insert(principal);

    app(&sink, DontReport::none()).oneshot(req).await.unwrap();

    let alerts = sink.alerts();
    let login = alerts[0].1.login_info.as_ref().unwrap();
    assert_eq!(login.get("id"), Some(&json!(5)));
    assert!(!login.contains_key("random_string"));
}

#[tokio::test]
async fn external_callers_get_no_login_info() {
    let sink = MemorySink::new();
    app(&sink, DontReport::none())
        .oneshot(json_post("/broken", json!({"api_access_type": "partner"})))
        .await
        .unwrap();
    assert!(sink.alerts()[0].1.login_info.is_none());
}

#[tokio::test]
async fn client_errors_render_their_message() {
    let sink = MemorySink::new();
    let resp = app(&sink, DontReport::none())
        .oneshot(get_req("/missing"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["message"], "No such order");
    assert_eq!(sink.len(), 1);
    assert!(sink.alerts()[0].1.request.data.is_none());
}

#[tokio::test]
async fn filtered_kind_is_rendered_but_not_alerted() {
    let sink = MemorySink::new();
    let resp = app(&sink, DontReport::none().kind("not_found"))
        .oneshot(get_req("/missing"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn panic_becomes_500_and_alert() {
    let sink = MemorySink::new();
    let resp = app(&sink, DontReport::none())
        .oneshot(get_req("/explode"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(resp).await,
        json!({"success": false, "message": "Internal Server Error"})
    );

    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].0, "*Back-end* : inventory invariant broken");
}

#[tokio::test]
async fn oversized_body_is_passed_through_unsnapshotted() {
    let sink = MemorySink::new();
    let handler = ExceptionHandler::new(Arc::new(sink.clone()));
    let router = Router::new().route("/broken", post(broken));
    let app = with_exception_reporting(router, ReportState::new(handler, 8));

    let resp = app
        .oneshot(json_post("/broken", json!({"order": 123456789})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(sink.alerts()[0].1.request.data.is_none());
}

#[tokio::test]
async fn form_body_is_snapshotted() {
    let sink = MemorySink::new();
    let raw = "api_access_type=internal&sku=A1";
    let req = Request::builder()
        .method(Method::POST)
        .uri("/broken")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("content-length", raw.len())
        .body(Body::from(raw))
        .unwrap();
    app(&sink, DontReport::none()).oneshot(req).await.unwrap();

    let alerts = sink.alerts();
    let payload = &alerts[0].1;
    assert_eq!(payload.request.system_access_type.as_deref(), Some("internal"));
    assert!(payload.login_info.is_some());
    assert_eq!(payload.request.data.as_ref().unwrap()["sku"], "A1");
}

#[tokio::test]
async fn json_without_length_is_snapshotted() {
    let sink = MemorySink::new();
    let req = chunked_post(
        "/broken",
        "application/json",
        vec![chunk(r#"{"order": 9, "#), chunk(r#""api_access_type": "internal"}"#)],
    );
    app(&sink, DontReport::none()).oneshot(req).await.unwrap();

    let alerts = sink.alerts();
    let payload = &alerts[0].1;
    assert_eq!(payload.request.system_access_type.as_deref(), Some("internal"));
    assert_eq!(payload.request.data.as_ref().unwrap()["order"], 9);
}

#[tokio::test]
async fn body_over_limit_without_length_reaches_handler_intact() {
    let sink = MemorySink::new();
    let handler = ExceptionHandler::new(Arc::new(sink.clone()));
    let router = Router::new().route("/echo", post(echo_then_fail));
    let app = with_exception_reporting(router, ReportState::new(handler, 8));

    let req = chunked_post(
        "/echo",
        "application/json",
        vec![chunk(r#"{"order":"#), chunk(r#" 123456789}"#)],
    );
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["message"], "received 20 bytes");
    assert!(sink.alerts()[0].1.request.data.is_none());
}

#[tokio::test]
async fn body_read_error_still_runs_handler_and_reports() {
    let sink = MemorySink::new();
    let req = chunked_post(
        "/broken",
        "application/json",
        vec![
            chunk(r#"{"order":"#),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")),
        ],
    );
    let resp = app(&sink, DontReport::none()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].0, "*Back-end* : ledger offline");
    assert!(alerts[0].1.request.data.is_none());
}

#[tokio::test]
async fn path_rejection_is_enveloped_and_alerted() {
    let sink = MemorySink::new();
    let resp = app(&sink, DontReport::none())
        .oneshot(get_req("/orders/seven"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().contains("seven"));
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn json_rejection_is_enveloped_and_filterable() {
    let sink = MemorySink::new();
    let raw = "{\"broken\":";
    let req = Request::builder()
        .method(Method::POST)
        .uri("/orders")
        .header("content-type", "application/json")
        .header("content-length", raw.len())
        .body(Body::from(raw))
        .unwrap();
    let resp = app(&sink, DontReport::none().kind("rejected"))
        .oneshot(req)
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["success"], false);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn valid_json_reaches_handler() {
    let sink = MemorySink::new();
    let resp = app(&sink, DontReport::none())
        .oneshot(json_post("/orders", json!({"sku": "A1"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"], json!({"sku": "A1"}));
    assert!(sink.is_empty());
}
