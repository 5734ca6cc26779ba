// HttpLoader against a local axum upstream.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use smart_preload_engine::catalog::{Priority, ResourceCatalog, ResourceDescriptor, ResourceKind};
use smart_preload_engine::config::PreloadConfig;
use smart_preload_engine::engine::LoadError;
use smart_preload_engine::host::{
    Fetcher, FontLoader, Host, HttpLoader, ImageLoader, MemoryDocument, TokioClock,
};
use smart_preload_engine::report::NOTICE_ID;
use smart_preload_engine::Preloader;

const DATA_BODY: &str = "{\"sections\":[\"about\",\"projects\"]}";

async fn serve_data() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        DATA_BODY,
    )
}

/// Echo the credential header so tests can see what was sent.
async fn serve_whoami(req: Request) -> impl IntoResponse {
    req.headers()
        .get("x-session")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string()
}

async fn serve_logo() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png")],
        vec![0x89u8, b'P', b'N', b'G', 0, 0, 0, 0],
    )
}

async fn serve_page() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        "<html></html>",
    )
}

async fn serve_font() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "font/woff2")],
        vec![b'w', b'O', b'F', b'2'],
    )
}

async fn serve_slow() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(10)).await;
    "late"
}

async fn start_server() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/data.json", get(serve_data))
        .route("/whoami", get(serve_whoami))
        .route("/logo.png", get(serve_logo))
        .route("/page", get(serve_page))
        .route("/font.woff2", get(serve_font))
        .route("/slow", get(serve_slow));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

fn loader() -> HttpLoader {
    HttpLoader::new(HashMap::new()).unwrap()
}

#[tokio::test]
async fn test_fetch_returns_body() {
    let (addr, _handle) = start_server().await;
    let body = loader()
        .fetch(&format!("http://{}/data.json", addr), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(&body[..], DATA_BODY.as_bytes());
}

#[tokio::test]
async fn test_fetch_maps_status_code() {
    let (addr, _handle) = start_server().await;
    let err = loader()
        .fetch(&format!("http://{}/missing", addr), CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, LoadError::Http(404));
    assert_eq!(err.to_string(), "HTTP 404");
}

#[tokio::test]
async fn test_fetch_stops_when_cancelled() {
    let (addr, _handle) = start_server().await;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = loader()
        .fetch(&format!("http://{}/slow", addr), cancel)
        .await
        .unwrap_err();
    assert_eq!(err, LoadError::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    // Bind and drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = loader()
        .fetch(&format!("http://{}/data.json", addr), CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::Network(_)));
}

#[tokio::test]
async fn test_image_requires_image_content_type() {
    let (addr, _handle) = start_server().await;
    let http = loader();

    assert!(http
        .load_image(&format!("http://{}/logo.png", addr), false)
        .await
        .is_ok());
    assert_eq!(
        http.load_image(&format!("http://{}/page", addr), false)
            .await
            .unwrap_err(),
        LoadError::ImageLoad
    );
    assert_eq!(
        http.load_image(&format!("http://{}/nope.png", addr), true)
            .await
            .unwrap_err(),
        LoadError::ImageLoad
    );
}

#[tokio::test]
async fn test_image_handles_are_distinct() {
    let (addr, _handle) = start_server().await;
    let http = loader();
    let url = format!("http://{}/logo.png", addr);
    let first = http.load_image(&url, false).await.unwrap();
    let second = http.load_image(&url, false).await.unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_font_preload() {
    let (addr, _handle) = start_server().await;
    let http = loader();
    assert!(http
        .preload_font(&format!("http://{}/font.woff2", addr))
        .await
        .is_ok());
    assert_eq!(
        http.preload_font(&format!("http://{}/missing.woff2", addr))
            .await
            .unwrap_err(),
        LoadError::FontLoad
    );
}

#[tokio::test]
async fn test_credential_headers_follow_updates() {
    let (addr, _handle) = start_server().await;
    let http = loader();
    let url = format!("http://{}/whoami", addr);

    let body = http.fetch(&url, CancellationToken::new()).await.unwrap();
    assert_eq!(&body[..], b"none");

    http.update_headers(HashMap::from([(
        "x-session".to_string(),
        "abc".to_string(),
    )]));
    let body = http.fetch(&url, CancellationToken::new()).await.unwrap();
    assert_eq!(&body[..], b"abc");
}

#[tokio::test]
async fn test_preloader_over_http() {
    let (addr, _handle) = start_server().await;
    let base = format!("http://{}", addr);
    let catalog = ResourceCatalog::new(vec![
        ResourceDescriptor::new(
            "data",
            format!("{}/data.json", base),
            ResourceKind::Generic,
            Priority::Critical,
        ),
        ResourceDescriptor::new(
            "logo",
            format!("{}/logo.png", base),
            ResourceKind::Image,
            Priority::High,
        ),
        ResourceDescriptor::new(
            "config",
            format!("{}/missing.json", base),
            ResourceKind::Generic,
            Priority::High,
        ),
        ResourceDescriptor::new(
            "icons",
            format!("{}/font.woff2", base),
            ResourceKind::Font,
            Priority::Medium,
        ),
    ])
    .unwrap();

    let http = Arc::new(loader());
    let doc = Arc::new(MemoryDocument::new());
    let host = Host {
        clock: Arc::new(TokioClock),
        fetcher: http.clone(),
        images: http.clone(),
        fonts: http,
        image_refs: doc.clone(),
        notices: doc.clone(),
    };
    let preloader = Preloader::new(PreloadConfig::default(), catalog, host).unwrap();

    let session = preloader.start().await;
    session.complete().await;
    assert!(session.outcome("data").unwrap().is_success());
    assert!(session.outcome("logo").unwrap().is_success());
    assert!(session.outcome("icons").unwrap().is_success());
    assert_eq!(
        session.outcome("config").unwrap().reason.as_deref(),
        Some("HTTP 404")
    );
    assert_eq!(session.stats().downloaded_bytes, DATA_BODY.len() as u64);

    let mut mounted = None;
    for _ in 0..100 {
        mounted = doc.notice(NOTICE_ID);
        if mounted.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let notice = mounted.expect("failure notice rendered");
    assert!(notice.lists("config"));
    assert_eq!(notice.entries.len(), 1);
}
