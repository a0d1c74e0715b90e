#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use syukatsu_api::backend::{Backend, InMemoryBackend};
use syukatsu_api::config::{BackendConfig, Config};
use syukatsu_api::routes::build_router;
use syukatsu_api::state::AppState;

pub const DOMAIN: &str = "example-u.ac.jp";

pub struct TestApp {
    pub router: Router,
    pub backend: Arc<InMemoryBackend>,
}

pub fn test_app() -> TestApp {
    let backend = Arc::new(InMemoryBackend::default());
    let config = Config {
        backend: BackendConfig::Memory,
        institution_email_domain: DOMAIN.to_string(),
        signup_redirect_url: Some("http://localhost:3000/auth/callback".to_string()),
        port: 0,
        rust_log: "debug".to_string(),
    };
    let state = AppState::new(
        &config,
        Backend {
            auth: backend.clone(),
            store: backend.clone(),
        },
    );
    TestApp {
        router: build_router(state),
        backend,
    }
}

impl TestApp {
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("json body")))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router dispatch");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json response")
        };
        (status, payload)
    }

    /// Signs up through the API and follows the emailed link; the account
    /// has no profile yet.
    pub async fn confirmed_token(&self, email: &str) -> String {
        let (status, _) = self
            .call(
                Method::POST,
                "/api/v1/auth/signup",
                None,
                Some(json!({ "email": email })),
            )
            .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        self.backend
            .confirm_sign_in_link(email)
            .await
            .expect("link was sent")
            .access_token
    }

    /// Token of a fully provisioned account.
    pub async fn provisioned_token(&self, email: &str, name: &str) -> String {
        let token = self.confirmed_token(email).await;
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/me/profile",
                Some(&token),
                Some(profile_body(name, "password123", "password123")),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "profile completion failed: {body}");
        token
    }
}

pub fn profile_body(name: &str, password: &str, confirm: &str) -> Value {
    json!({
        "name": name,
        "department": "情報学部",
        "password": password,
        "confirm_password": confirm
    })
}

pub fn error_message(body: &Value) -> &str {
    body["error"]["message"].as_str().unwrap_or_default()
}

/// `path?key=value&..` with the pairs form-urlencoded (request URIs must be
/// ASCII).
pub fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
    let query = serde_urlencoded::to_string(pairs).expect("encodable query");
    format!("{path}?{query}")
}
