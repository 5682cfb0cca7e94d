//! HTTP adapter tests against a fake provisioning backend.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use streamtorrent_domain::{ContentLocator, ProvisioningStatus, SessionId};
use streamtorrent_player::application::ProvisioningApi;
use streamtorrent_player::infrastructure::HttpApiClient;
use streamtorrent_player::ports::outbound::{ApiError, ProvisioningApiPort};

#[derive(Clone, Default)]
struct Backend {
    deleted: Arc<Mutex<Vec<String>>>,
}

async fn create_stream(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    match body["input"].as_str() {
        Some(input) if input.starts_with("magnet:?xt=urn:btih:bad") => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid magnet link" })),
        ),
        Some(_) => (
            StatusCode::OK,
            Json(json!({ "id": "abc123", "message": "Stream started" })),
        ),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "input required" })),
        ),
    }
}

async fn stream_status(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    match id.as_str() {
        "abc123" => (
            StatusCode::OK,
            Json(json!({
                "id": "abc123",
                "status": "ready",
                "progress": 100.0,
                "peers": 7,
                "speed": 1.5,
                "downloaded": 700.0,
                "fileName": "The.Matrix.1999.mkv",
                "hlsUrl": "/hls/abc123/master.m3u8",
                "error": ""
            })),
        ),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            (StatusCode::OK, Json(json!({ "status": "pending" })))
        }
        "broken" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "transcoder crashed" })),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Stream not found" })),
        ),
    }
}

async fn delete_stream(State(backend): State<Backend>, Path(id): Path<String>) -> StatusCode {
    backend.deleted.lock().expect("lock").push(id);
    StatusCode::NO_CONTENT
}

async fn start_backend() -> (SocketAddr, Backend) {
    let backend = Backend::default();
    let router = Router::new()
        .route("/api/stream", post(create_stream))
        .route("/api/stream/{id}/status", get(stream_status))
        .route("/api/stream/{id}", delete(delete_stream))
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    (addr, backend)
}

fn api_for(addr: SocketAddr) -> ProvisioningApi {
    api_with_timeout(addr, Duration::from_secs(5))
}

fn api_with_timeout(addr: SocketAddr, timeout: Duration) -> ProvisioningApi {
    ProvisioningApi::new(Arc::new(HttpApiClient::new(
        &format!("http://{addr}"),
        timeout,
    )))
}

fn id(value: &str) -> SessionId {
    SessionId::new(value).expect("valid id")
}

#[tokio::test]
async fn creates_session_from_locator() {
    let (addr, _) = start_backend().await;
    let api = api_for(addr);

    let locator = ContentLocator::parse("  tt0133093 ").expect("valid locator");
    let session = api.create_session(&locator).await.expect("created");

    assert_eq!(session, id("abc123"));
}

#[tokio::test]
async fn backend_rejection_carries_its_message() {
    let (addr, _) = start_backend().await;
    let api = api_for(addr);

    let locator = ContentLocator::parse("magnet:?xt=urn:btih:bad").expect("valid locator");
    let err = api.create_session(&locator).await.expect_err("rejected");

    assert_eq!(err, ApiError::http(400, "invalid magnet link"));
}

#[tokio::test]
async fn status_resolves_relative_manifest() {
    let (addr, _) = start_backend().await;
    let api = api_for(addr);

    let record = api
        .fetch_status(&id("abc123"))
        .await
        .expect("fetched")
        .expect("known session");

    assert_eq!(record.status, ProvisioningStatus::Ready);
    assert_eq!(record.peer_count, 7);
    assert_eq!(record.throughput_mbps, Some(1.5));
    assert_eq!(record.file(), Some("The.Matrix.1999.mkv"));
    assert_eq!(record.error(), None);
    assert_eq!(
        record.ready_manifest(),
        Some(format!("http://{addr}/hls/abc123/master.m3u8").as_str())
    );
}

#[tokio::test]
async fn unknown_session_is_not_an_error() {
    let (addr, _) = start_backend().await;
    let api = api_for(addr);

    let status = api.fetch_status(&id("missing")).await.expect("no error");

    assert!(status.is_none());
}

#[tokio::test]
async fn server_error_is_reported_with_status() {
    let (addr, _) = start_backend().await;
    let api = api_for(addr);

    let err = api.fetch_status(&id("broken")).await.expect_err("server error");

    assert_eq!(err, ApiError::http(500, "transcoder crashed"));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn delete_reaches_backend() {
    let (addr, backend) = start_backend().await;
    let api = api_for(addr);

    api.delete_session(&id("abc123")).await.expect("deleted");

    assert_eq!(*backend.deleted.lock().expect("lock"), vec!["abc123".to_string()]);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let api = api_for(addr);

    let err = api.fetch_status(&id("abc123")).await.expect_err("refused");

    assert!(err.is_transport(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn hung_backend_times_out_as_transport_error() {
    let (addr, _) = start_backend().await;
    let api = api_with_timeout(addr, Duration::from_millis(100));

    let started = std::time::Instant::now();
    let err = api.fetch_status(&id("slow")).await.expect_err("timed out");

    assert!(matches!(err, ApiError::RequestFailed(_)), "unexpected error: {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}
