//! Browser-extension endpoints: API key, per-user token and CORS.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::Value;

use common::*;
use jobtrail_api::config::{Config, Environment};

const API_KEY: &str = "ext-key-for-tests";
const ORIGIN: &str = "chrome-extension://abcdefghijklmnop";

fn app_with_key() -> TestApp {
    let mut config = Config::for_development(TEST_SECRET);
    config.extension_api_key = Some(API_KEY.into());
    TestApp::with_config(config)
}

async fn extension_token(app: &TestApp, session: &str) -> String {
    let response = app
        .send(with_cookie(
            json_request(Method::POST, "/api/extension/token", ""),
            &format!("jt_session={session}"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["token"].as_str().expect("token").to_string()
}

fn extension_call(uri: &str, body: &str, key: Option<&str>, token: Option<&str>) -> Request<Body> {
    let mut request = with_header(json_request(Method::POST, uri, body), "origin", ORIGIN);
    if let Some(key) = key {
        request = with_header(request, "x-api-key", key);
    }
    if let Some(token) = token {
        request = with_header(request, "x-user-token", token);
    }
    request
}

#[tokio::test]
async fn token_issue_requires_session() {
    let app = app_with_key();
    let response = app
        .send(json_request(Method::POST, "/api/extension/token", ""))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verify_resolves_token_owner() {
    let app = app_with_key();
    let (session, user_id) = app.register("ext@example.com", "password123").await;
    let token = extension_token(&app, &session).await;

    let response = app
        .send(extension_call("/api/extension/verify", "", Some(API_KEY), Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], Value::String(user_id));
    assert_eq!(body["user"]["email"], "ext@example.com");
}

#[tokio::test]
async fn missing_or_wrong_api_key_is_rejected_with_cors() {
    let app = app_with_key();
    let (session, _) = app.register("key@example.com", "password123").await;
    let token = extension_token(&app, &session).await;

    for key in [None, Some("wrong-key")] {
        let response = app
            .send(extension_call("/api/extension/verify", "", key, Some(&token)))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }
}

#[tokio::test]
async fn session_token_is_not_an_extension_token() {
    let app = app_with_key();
    let (session, _) = app.register("kinds@example.com", "password123").await;

    let response = app
        .send(extension_call("/api/extension/verify", "", Some(API_KEY), Some(&session)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn saved_job_belongs_to_token_owner() {
    let app = app_with_key();
    let (session_a, user_a) = app.register("a@example.com", "password123").await;
    let (session_b, user_b) = app.register("b@example.com", "password123").await;
    let token_a = extension_token(&app, &session_a).await;

    // A body naming another user changes nothing
    let body = format!(
        r#"{{"title":"Rust Engineer","company":"Acme","url":"https://acme.test/jobs/1","user_id":"{user_b}"}}"#
    );
    let response = app
        .send(extension_call("/api/extension/jobs", &body, Some(API_KEY), Some(&token_a)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["job"]["user_id"], Value::String(user_a));
    assert_eq!(body["job"]["title"], "Rust Engineer");

    let mine = app
        .send(with_cookie(get("/api/jobs"), &format!("jt_session={session_a}")))
        .await;
    assert_eq!(mine.status(), StatusCode::OK);
    assert_eq!(body_json(mine).await.as_array().map(Vec::len), Some(1));

    let theirs = app
        .send(with_cookie(get("/api/jobs"), &format!("jt_session={session_b}")))
        .await;
    assert_eq!(body_json(theirs).await.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn invalid_job_is_bad_request() {
    let app = app_with_key();
    let (session, _) = app.register("bad@example.com", "password123").await;
    let token = extension_token(&app, &session).await;

    let response = app
        .send(extension_call(
            "/api/extension/jobs",
            r#"{"title":"","company":"Acme"}"#,
            Some(API_KEY),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn extension_token_outlives_session() {
    let app = app_with_key();
    let (session, _) = app.register("long@example.com", "password123").await;
    let token = extension_token(&app, &session).await;

    app.clock.advance_ms(90 * 24 * 60 * 60 * 1000);
    let response = app
        .send(extension_call("/api/extension/verify", "", Some(API_KEY), Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    app.clock.advance_ms(91 * 24 * 60 * 60 * 1000);
    let response = app
        .send(extension_call("/api/extension/verify", "", Some(API_KEY), Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn preflight_is_answered() {
    let app = app_with_key();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/extension/jobs")
        .header("origin", ORIGIN)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,x-api-key,x-user-token")
        .body(Body::empty())
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"));
    let allowed = headers
        .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .unwrap()
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("x-api-key"));
    assert!(allowed.contains("x-user-token"));
}

#[tokio::test]
async fn rate_limited_extension_call_carries_cors() {
    let app = app_with_key();
    for _ in 0..30 {
        app.send(extension_call("/api/extension/jobs", "{}", None, None)).await;
    }
    let response = app
        .send(extension_call("/api/extension/jobs", "{}", None, None))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn development_without_key_skips_key_check() {
    let app = TestApp::new();
    let (session, _) = app.register("dev@example.com", "password123").await;
    let token = extension_token(&app, &session).await;

    let response = app
        .send(extension_call("/api/extension/verify", "", None, Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn production_without_key_refuses() {
    let mut config = Config::for_development(TEST_SECRET);
    config.environment = Environment::Production;
    let app = TestApp::with_config(config);
    let (session, _) = app.register("prodext@example.com", "password123").await;
    let token = extension_token(&app, &session).await;

    let response = app
        .send(extension_call("/api/extension/verify", "", Some("anything"), Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
