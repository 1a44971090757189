//! End-to-end checks against a real bound socket: the router responds over
//! HTTP exactly as `serve()` would wire it up, without going through the
//! public `serve()` entry point (which blocks until a shutdown signal).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use hackare_server::{archive::AssetIndex, router::build_router};

async fn spawn_test_server() -> String {
    let index = Arc::new(AssetIndex::load().expect("load embedded bundle"));
    let app = build_router(index);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn root_request_returns_the_index_page() {
    let base = spawn_test_server().await;
    let response = reqwest::get(format!("{base}/")).await.expect("request root");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers().get("content-type").expect("content-type header"), "text/html; charset=utf-8");
}

#[tokio::test]
async fn unmatched_path_returns_404() {
    let base = spawn_test_server().await;
    let response = reqwest::get(format!("{base}/does-not-exist")).await.expect("request unknown path");
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
