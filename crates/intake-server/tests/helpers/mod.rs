//! Test helpers for intake server integration tests
//!
//! - An in-memory application router
//! - A request helper returning status, headers and JSON body
//! - The behavioural contract every record store must satisfy

#![allow(dead_code)]

pub mod contract;

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use intake_server::{api, config::Config, store::StoreBackend, Store};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

pub const BASE_URL: &str = "https://apply.example.org";

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.store.backend = StoreBackend::Memory;
    config.invitations.public_base_url = BASE_URL.to_string();
    config
}

/// Router backed by a fresh in-memory store, plus a handle to that store.
pub fn setup_test_app() -> (Router, Store) {
    let store = Store::in_memory();
    let app = api::create_router(store.clone(), &test_config());
    (app, store)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        json,
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, None).await
}

pub async fn put(app: &Router, uri: &str, body: Value) -> TestResponse {
    send(app, Method::PUT, uri, Some(body)).await
}

/// Issue an invitation through the API and return its token.
pub async fn invite(app: &Router) -> String {
    let response = send(app, Method::POST, "/invitations", None).await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.json["token"].as_str().unwrap().to_string()
}
