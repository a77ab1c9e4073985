//! Helpers shared by the router and client tests.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

use crate::auth::models::UserType;
use crate::config::Config;
use crate::server::{AppState, build_router};

pub const VALID_CPF: &str = "52998224725";
pub const PASSWORD: &str = "segredo123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "APP_ENV" => Some("test".to_string()),
            "JWT_SECRET" => Some("test_secret".to_string()),
            _ => None,
        })
        .expect("test configuration");
        let state = AppState::in_memory(&config);
        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    /// Serve the router on an ephemeral local port; returns its base URL.
    pub async fn spawn(&self) -> String {
        serve(self.router.clone()).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    fn request(method: Method, uri: &str, body: Option<Value>, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        request.expect("test request")
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Self::request(Method::GET, uri, None, token)).await
    }

    /// A `Value::Null` body is sent as an empty body.
    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        let body = (!body.is_null()).then_some(body);
        self.send(Self::request(Method::POST, uri, body, token)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Self::request(Method::PATCH, uri, None, token)).await
    }

    pub fn signup_body(&self, email: &str, cpf: &str, user_type: UserType) -> Value {
        json!({
            "email": email,
            "password": PASSWORD,
            "cpf": cpf,
            "name": "Ana Souza",
            "userType": user_type,
        })
    }

    pub fn login_body(&self, identifier: &str, user_type: UserType) -> Value {
        json!({
            "identifier": identifier,
            "password": PASSWORD,
            "userType": user_type,
        })
    }

    /// Register with [`VALID_CPF`]; returns the issued token.
    pub async fn register(&self, email: &str, user_type: UserType) -> String {
        self.register_with_cpf(email, VALID_CPF, user_type).await
    }

    pub async fn register_with_cpf(&self, email: &str, cpf: &str, user_type: UserType) -> String {
        let (status, body) = self
            .post("/api/auth/signup", self.signup_body(email, cpf, user_type), None)
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        body["data"]["token"].as_str().expect("token in signup response").to_string()
    }
}

/// Serve `router` on an ephemeral local port; returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("test listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}

/// A local URL on which nothing listens.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind unused listener");
    let addr = listener.local_addr().expect("unused listener address");
    drop(listener);
    format!("http://{addr}")
}
