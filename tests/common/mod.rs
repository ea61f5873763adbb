//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use jobtrail_api::{
    build_router,
    config::Config,
    db::MemoryStore,
    services::clock::{Clock, ManualClock},
    AppState,
};

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
/// 2025-01-01T00:00:00Z
pub const START_MS: i64 = 1_735_689_600_000;

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::for_development(TEST_SECRET))
    }

    pub fn with_config(config: Config) -> Self {
        let clock = Arc::new(ManualClock::new(START_MS));
        let state = AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            clock.clone() as Arc<dyn Clock>,
        )
        .expect("app state");
        Self {
            router: build_router(state),
            clock,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.expect("infallible")
    }

    /// Registers an account and returns its session token and user id.
    pub async fn register(&self, email: &str, password: &str) -> (String, String) {
        let response = self
            .send(json_request(
                Method::POST,
                "/api/auth/register",
                &format!(r#"{{"email":"{email}","password":"{password}"}}"#),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let token = cookie_value(response.headers(), "jt_session").expect("session cookie");
        let body = body_json(response).await;
        let id = body["user"]["id"].as_str().expect("user id").to_string();
        (token, id)
    }
}

pub fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().expect("cookie header"));
    request
}

pub fn with_header(mut request: Request<Body>, name: &'static str, value: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(name, value.parse().expect("header value"));
    request
}

/// Every `Set-Cookie` line in the response.
pub fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

pub fn set_cookie_for(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    set_cookies(headers).into_iter().find(|c| c.starts_with(&prefix))
}

pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let line = set_cookie_for(headers, name)?;
    let pair = line.split(';').next()?;
    pair.split_once('=').map(|(_, v)| v.to_string())
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
