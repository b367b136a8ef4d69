//! Shared helpers for HTTP tests over the in-memory store.

#![allow(dead_code, clippy::unwrap_used)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use chrono::Duration;
use jsonwebtoken::Algorithm;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use order_desk_api::config::{ApiConfig, PasswordHashConfig, StoreConfig, TokenConfig};
use order_desk_api::db::MemoryStore;
use order_desk_api::routes;
use order_desk_api::state::AppState;

pub const PASSWORD: &str = "correct horse battery";

pub struct TestApp {
    pub router: Router,
    pub state: AppState<MemoryStore>,
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

fn config() -> ApiConfig {
    ApiConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        store: StoreConfig::Memory,
        token: TokenConfig {
            secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"),
            algorithm: Algorithm::HS256,
            access_token_ttl: Duration::minutes(30),
        },
        // Cheap hashing keeps the suite fast.
        password_hash: PasswordHashConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(config(), MemoryStore::new()).unwrap();
        Self {
            router: routes::router(state.clone()),
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        Response {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(request("GET", uri, token, Body::empty(), None))
            .await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: &Value) -> Response {
        self.send(request(
            "POST",
            uri,
            token,
            Body::from(body.to_string()),
            Some("application/json"),
        ))
        .await
    }

    pub async fn post_empty(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(request("POST", uri, token, Body::empty(), None))
            .await
    }

    pub async fn post_form(&self, uri: &str, form: &str) -> Response {
        self.send(request(
            "POST",
            uri,
            None,
            Body::from(form.to_string()),
            Some("application/x-www-form-urlencoded"),
        ))
        .await
    }

    /// Register an account and return its access token.
    pub async fn signup(&self, email: &str, admin: bool) -> String {
        let created = self
            .post_json(
                "/auth/create-account",
                None,
                &json!({
                    "name": "Test User",
                    "email": email,
                    "password": PASSWORD,
                    "admin": admin,
                }),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);

        let login = self
            .post_json(
                "/auth/login",
                None,
                &json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(login.status, StatusCode::OK, "{:?}", login.body);
        login.body["access_token"].as_str().unwrap().to_string()
    }

    /// Create an order owned by the token's user and return its id.
    pub async fn create_order_for(&self, token: &str, owner_user_id: i64) -> i64 {
        let created = self
            .post_json(
                "/orders/order",
                Some(token),
                &json!({ "owner_user_id": owner_user_id }),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
        created.body["order_id"].as_i64().unwrap()
    }

    /// The user id a token was issued for.
    pub fn user_id(&self, token: &str) -> i64 {
        i64::from(self.state.tokens().verify(token).unwrap().as_i32())
    }
}

fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Body,
    content_type: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body).unwrap()
}
