// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signup, two-step login and password reset through the HTTP API.

use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

mod common;

const LOGIN_SUBJECT: &str = "2FA Login Code";
const RESET_SUBJECT: &str = "Password Reset Code";

#[tokio::test]
async fn test_signup_returns_provisioning_uri() {
    let app = common::create_test_app();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "name": "Ana",
                "email": "Ana@Example.com",
                "password": "password123",
                "age": 30
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "ana@example.com");
    assert_eq!(body["name"], "Ana");
    assert!(body["otp_provisioning_uri"]
        .as_str()
        .unwrap()
        .starts_with("otpauth://totp/"));
    assert!(body.get("hashed_password").is_none());
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = common::create_test_app();
    app.signup("Ana", "ana@example.com", "password123").await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({ "name": "Other", "email": "ANA@example.com", "password": "password456" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_signup_validation() {
    let app = common::create_test_app();

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({ "name": "Ana", "email": "not-an-email", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({ "name": "Ana", "email": "ana@example.com", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_two_step_login() {
    let app = common::create_test_app();
    app.signup("Ana", "ana@example.com", "password123").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("2FA"));

    let code = app
        .mailbox
        .wait_for_code("ana@example.com", LOGIN_SUBJECT)
        .await;
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/verify-login",
            None,
            Some(json!({ "email": "ana@example.com", "code": code })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, me) = app
        .request(Method::GET, "/api/v1/users/me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ana@example.com");
    assert!(me.get("two_fa_key").is_none());

    // Codes are single use.
    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/auth/verify-login",
            None,
            Some(json!({ "email": "ana@example.com", "code": code })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_login_sets_session_cookie() {
    let app = common::create_test_app();
    app.signup("Ana", "ana@example.com", "password123").await;
    app.request(
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "ana@example.com", "password": "password123" })),
    )
    .await;
    let code = app
        .mailbox
        .wait_for_code("ana@example.com", LOGIN_SUBJECT)
        .await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/verify-login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    json!({ "email": "ana@example.com", "code": code }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("sportify_token="));
    assert!(cookie.contains("HttpOnly"));

    // The cookie alone authenticates.
    let session = cookie.split(';').next().unwrap().to_string();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/me")
                .header(header::COOKIE, session)
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = common::create_test_app();
    app.signup("Ana", "ana@example.com", "password123").await;

    let (wrong_pw_status, wrong_pw) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "wrongpass1" })),
        )
        .await;
    let (unknown_status, unknown) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "password123" })),
        )
        .await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw, unknown);
}

#[tokio::test]
async fn test_wrong_login_code_rejected() {
    let app = common::create_test_app();
    app.signup("Ana", "ana@example.com", "password123").await;
    app.request(
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "ana@example.com", "password": "password123" })),
    )
    .await;
    let code = app
        .mailbox
        .wait_for_code("ana@example.com", LOGIN_SUBJECT)
        .await;
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/verify-login",
            None,
            Some(json!({ "email": "ana@example.com", "code": wrong })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_code");
}

#[tokio::test]
async fn test_reset_code_cannot_complete_login() {
    let app = common::create_test_app();
    app.signup("Ana", "ana@example.com", "password123").await;

    app.request(
        Method::POST,
        "/api/v1/auth/request-password-reset",
        None,
        Some(json!({ "email": "ana@example.com" })),
    )
    .await;
    let reset_code = app
        .mailbox
        .wait_for_code("ana@example.com", RESET_SUBJECT)
        .await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/auth/verify-login",
            None,
            Some(json!({ "email": "ana@example.com", "code": reset_code })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = common::create_test_app();
    app.signup("Ana", "ana@example.com", "password123").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/request-password-reset",
            None,
            Some(json!({ "email": "ana@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password reset email sent if user exists.");

    let code = app
        .mailbox
        .wait_for_code("ana@example.com", RESET_SUBJECT)
        .await;

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/auth/confirm-password-reset",
            None,
            Some(json!({
                "email": "ana@example.com",
                "code": code,
                "new_password": "brandnew456"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "brandnew456" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset_unknown_email_is_generic() {
    let app = common::create_test_app();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/auth/request-password-reset",
            None,
            Some(json!({ "email": "ghost@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password reset email sent if user exists.");

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(app.mailbox.sent().is_empty());
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = common::create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/logout")
                .header(header::COOKIE, "sportify_token=abc")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("sportify_token="));
    assert!(cookie.contains("Max-Age=0"));
}
