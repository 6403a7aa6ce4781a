//! End-to-end tests against a real listener.
//!
//! Each test binds an ephemeral port on 127.0.0.1 so tests can run in parallel.
//!
//! Run with: cargo test --test server_tests

use backend::config::HttpServerConfig;
use backend::{create_router, start_server, ServerError, ServerHandle};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn base_url(server: &ServerHandle) -> String {
    format!("http://{}", server.local_addr())
}

fn ephemeral() -> HttpServerConfig {
    HttpServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        shutdown_timeout_seconds: 5,
    }
}

#[tokio::test]
async fn serves_health_over_tcp() {
    let server = start_server(create_router(), &ephemeral()).await.unwrap();
    assert_ne!(server.local_addr().port(), 0);

    let response = reqwest::get(format!("{}/health", base_url(&server)))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok", "message": "Backend is healthy!"}));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn serves_root_over_tcp() {
    let server = start_server(create_router(), &ephemeral()).await.unwrap();

    let response = reqwest::get(format!("{}/", base_url(&server))).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "Server is running!");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn malformed_json_over_tcp_is_rejected() {
    let server = start_server(create_router(), &ephemeral()).await.unwrap();

    let response = reqwest::Client::new()
        .post(format!("{}/", base_url(&server)))
        .header("content-type", "application/json")
        .body(r#"{"a":1"#)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    server.stop().await.unwrap();
}

#[tokio::test]
async fn port_in_use_fails_to_start() {
    let first = start_server(create_router(), &ephemeral()).await.unwrap();

    let mut config = ephemeral();
    config.port = first.local_addr().port();

    let err = start_server(create_router(), &config).await.unwrap_err();
    assert!(matches!(err, ServerError::Bind { .. }), "{err}");

    first.stop().await.unwrap();
}

#[tokio::test]
async fn stop_releases_the_port() {
    let server = start_server(create_router(), &ephemeral()).await.unwrap();
    let addr = server.local_addr();
    server.stop().await.unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn stop_closes_connections_left_open_past_the_deadline() {
    let mut config = ephemeral();
    config.shutdown_timeout_seconds = 1;
    let server = start_server(create_router(), &config).await.unwrap();

    // Declare 100 body bytes but send 4, so the JSON layer waits on the body.
    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
    stream
        .write_all(
            b"POST / HTTP/1.1\r\nHost: localhost\r\n\
              Content-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"a\"",
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    tokio::time::timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("stop did not return after the drain deadline")
        .unwrap();

    let mut buf = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(2), stream.read_to_end(&mut buf)).await;
    assert!(read.is_ok(), "connection still open after stop returned");
}

#[tokio::test]
async fn dropping_the_handle_shuts_the_server_down() {
    let server = start_server(create_router(), &ephemeral()).await.unwrap();
    let addr = server.local_addr();
    drop(server);

    let mut released = false;
    for _ in 0..50 {
        if TcpStream::connect(addr).await.is_err() {
            released = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(released, "listener still accepting after the handle was dropped");
}

#[tokio::test]
async fn wait_keeps_serving_until_shutdown() {
    let server = start_server(create_router(), &ephemeral()).await.unwrap();
    let url = format!("{}/health", base_url(&server));

    let waiting = tokio::spawn(server.wait());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiting.is_finished());

    let response = reqwest::get(url).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    waiting.abort();
}
