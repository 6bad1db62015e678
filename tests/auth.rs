//! Router-level checks for the API-key middleware and route wiring.
//!
//! The pool is created lazily and never connected: every request here is answered
//! before a handler reaches the database.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use crudkit::{ApiKeys, App, DatabaseSettings, Entity, Environment, Settings};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tower::ServiceExt;

struct Widget;

impl Entity for Widget {
    const TABLE: &'static str = "widget";
}

fn settings(environment: Environment, keys: ApiKeys) -> Settings {
    Settings {
        environment,
        debug: false,
        testing: environment == Environment::Testing,
        api_url: "/api/v1.0".into(),
        database: DatabaseSettings {
            url: "postgres://nobody@127.0.0.1:1/none".into(),
            min_connections: 0,
            max_connections: 1,
            acquire_timeout: Duration::from_millis(100),
        },
        api_keys: keys,
        body_limit: 1024,
    }
}

fn router(environment: Environment, keys: ApiKeys) -> Router {
    let s = settings(environment, keys);
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(s.database.acquire_timeout)
        .connect_lazy(&s.database.url)
        .unwrap();
    App::new(s, pool).entity::<Widget>("widget").into_router()
}

async fn send(app: Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn verbs() -> [(Method, &'static str); 5] {
    [
        (Method::GET, "/api/v1.0/widget"),
        (Method::GET, "/api/v1.0/widget/1"),
        (Method::POST, "/api/v1.0/widget"),
        (Method::PUT, "/api/v1.0/widget/1"),
        (Method::DELETE, "/api/v1.0/widget/1"),
    ]
}

#[tokio::test]
async fn missing_key_is_forbidden_on_every_verb() {
    let app = router(Environment::Production, ApiKeys::new("s3cret"));
    for (method, path) in verbs() {
        let (status, body) = send(app.clone(), method.clone(), path, r#"{"name":"x"}"#).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, path);
        assert_eq!(body, json!({"message": "forbidden", "data": {}, "status": "forbidden"}));
    }
}

#[tokio::test]
async fn wrong_key_is_forbidden_on_every_verb() {
    let app = router(Environment::Production, ApiKeys::new("s3cret"));
    for (method, path) in verbs() {
        let uri = format!("{}?api_key=guess", path);
        let (status, _) = send(app.clone(), method.clone(), &uri, r#"{"name":"x"}"#).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn correct_key_reaches_the_handler() {
    let app = router(Environment::Production, ApiKeys::new("s3cret"));
    // Non-integer id is answered by the handler without touching the database.
    let (status, body) = send(app.clone(), Method::GET, "/api/v1.0/widget/abc?api_key=s3cret", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Not found", "data": {}, "status": "unknown"}));

    let (status, _) = send(app, Method::POST, "/api/v1.0/widget?api_key=s3cret", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn per_method_key_overrides_default() {
    let keys = ApiKeys::new("s3cret").with_method(Method::DELETE, "admin");
    let app = router(Environment::Production, keys);
    let (status, _) = send(app.clone(), Method::DELETE, "/api/v1.0/widget/x?api_key=s3cret", "").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(app, Method::DELETE, "/api/v1.0/widget/x?api_key=admin", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_environment_skips_key_check() {
    let app = router(Environment::Testing, ApiKeys::default());
    let (status, _) = send(app.clone(), Method::GET, "/api/v1.0/widget/abc", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(app, Method::PUT, "/api/v1.0/widget", r#"{"name":"x"}"#).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = router(Environment::Testing, ApiKeys::default());
    let (status, body) = send(app, Method::POST, "/api/v1.0/widget", "[1,2]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!("error"));
}

#[tokio::test]
async fn common_routes_need_no_key() {
    let app = router(Environment::Production, ApiKeys::new("s3cret"));
    let (status, body) = send(app.clone(), Method::GET, "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = send(app, Method::GET, "/version", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["environment"], json!("prod"));
}

#[tokio::test]
async fn unrouted_paths_under_the_prefix_need_a_key() {
    let app = router(Environment::Production, ApiKeys::new("s3cret"));
    for path in ["/api/v1.0/nosuch", "/api/v1.0/widget/1/x"] {
        let (status, body) = send(app.clone(), Method::GET, path, "").await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", path);
        assert_eq!(body["status"], json!("forbidden"));
    }

    let (status, body) = send(app.clone(), Method::GET, "/api/v1.0/nosuch?api_key=s3cret", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Not found", "data": {}, "status": "unknown"}));

    let (status, _) = send(app, Method::GET, "/ready", "").await;
    assert_ne!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unrouted_paths_are_not_found_in_test_environment() {
    let app = router(Environment::Testing, ApiKeys::default());
    let (status, _) = send(app, Method::GET, "/api/v1.0/nosuch", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
