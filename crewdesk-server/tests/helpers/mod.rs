//! Shared helpers for crewdesk-server integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use crewdesk_server::config::ServiceConfig;
use crewdesk_server::store::WorkerStore;
use crewdesk_server::{build_router, AppState};
use serde_json::Value;
use std::time::Duration;

/// Config with no credentials and a short HTTP timeout
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        http_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

pub fn setup_state(store: WorkerStore, config: ServiceConfig) -> AppState {
    AppState::new(store, config).expect("Should build app state")
}

/// App over an empty in-memory store with nothing configured
pub fn setup_app() -> Router {
    build_router(setup_state(WorkerStore::in_memory(), test_config()))
}

pub fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn extract_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Serve `router` on an ephemeral local port; returns `http://127.0.0.1:<port>`
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind ephemeral port");
    let addr = listener.local_addr().expect("Should have local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{}", addr)
}
