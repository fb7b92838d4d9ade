// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::Value;
use sportify_api::config::Config;
use sportify_api::db::Db;
use sportify_api::routes::create_router;
use sportify_api::services::EmailSender;
use sportify_api::AppState;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

/// One captured outgoing email.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Email sender that keeps everything in memory for assertions.
#[derive(Default)]
pub struct Mailbox {
    sent: Mutex<Vec<SentEmail>>,
}

#[async_trait]
impl EmailSender for Mailbox {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), String> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[allow(dead_code)]
impl Mailbox {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Wait for the delivery worker, then return the code from the newest
    /// email to `to` whose subject contains `subject`.
    pub async fn wait_for_code(&self, to: &str, subject: &str) -> String {
        for _ in 0..200 {
            let found = self
                .sent()
                .into_iter()
                .rev()
                .find(|m| m.to == to && m.subject.contains(subject));
            if let Some(mail) = found {
                return extract_code(&mail.body);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no '{subject}' email delivered to {to}");
    }
}

fn extract_code(body: &str) -> String {
    let start = body.find("<strong>").expect("code start") + "<strong>".len();
    let end = body[start..].find("</strong>").expect("code end") + start;
    body[start..end].to_string()
}

/// Test application backed by the in-memory store and a capturing mailbox.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mailbox: Arc<Mailbox>,
}

pub fn create_test_app() -> TestApp {
    let config = Config::test_default();
    let mailbox = Arc::new(Mailbox::default());
    let state = Arc::new(AppState::new(config, Db::new_in_memory(), mailbox.clone()));

    TestApp {
        router: create_router(state.clone()),
        state,
        mailbox,
    }
}

#[allow(dead_code)]
impl TestApp {
    /// Send a request with an optional JSON body and bearer token.
    pub async fn request(
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
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Register an account and return its user id.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/auth/signup",
                None,
                Some(serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        body["user_id"].as_str().unwrap().to_string()
    }

    /// Register an account and mint a session token for it.
    pub async fn signup_with_token(&self, name: &str, email: &str) -> (String, String) {
        let user_id = self.signup(name, email, "password123").await;
        let token = create_test_jwt(email, &self.state.config.jwt_signing_key);
        (user_id, token)
    }
}

/// Create a test JWT token.
#[allow(dead_code)]
pub fn create_test_jwt(email: &str, signing_key: &[u8]) -> String {
    create_test_jwt_with_exp(email, signing_key, 86400)
}

/// Create a test JWT token expiring `ttl_secs` from now (negative for expired).
#[allow(dead_code)]
pub fn create_test_jwt_with_exp(email: &str, signing_key: &[u8], ttl_secs: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: email.to_string(),
        exp: (now + ttl_secs) as usize,
        iat: now as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}
