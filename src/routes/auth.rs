// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and login routes.
//!
//! Password login is two-step: `/auth/login` checks the password and emails a
//! code, `/auth/verify-login` trades that code for a session token. Users with
//! an authenticator app can log in in one step via `/auth/login/totp`.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::middleware::auth::SESSION_COOKIE;
use crate::routes::MessageResponse;
use crate::services::accounts::SignupInput;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/verify-login", post(verify_login))
        .route("/auth/login/totp", post(login_totp))
        .route("/auth/request-password-reset", post(request_password_reset))
        .route("/auth/confirm-password-reset", post(confirm_password_reset))
        .route("/auth/logout", post(logout))
}

// ─── Signup ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub gender: Option<String>,
    #[validate(range(min = 1, max = 120))]
    pub age: Option<u32>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignupResponse {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub message: String,
    pub otp_provisioning_uri: String,
}

async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    payload.validate()?;

    let outcome = state
        .accounts
        .signup(SignupInput {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            gender: payload.gender,
            age: payload.age,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: outcome.user.user_id,
            email: outcome.user.email,
            name: outcome.user.name,
            message: "User created successfully. Please set up 2FA with the provided URI."
                .to_string(),
            otp_provisioning_uri: outcome.otp_provisioning_uri,
        }),
    ))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyLoginRequest {
    #[validate(email)]
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TotpLoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub otp: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<MessageResponse>> {
    payload.validate()?;
    state
        .accounts
        .begin_login(&payload.email, &payload.password)
        .await?;
    Ok(MessageResponse::new(
        "2FA verification required. A login code has been sent to your email.",
    ))
}

async fn verify_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<VerifyLoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>)> {
    payload.validate()?;
    let token = state
        .accounts
        .complete_login(&payload.email, &payload.code)
        .await?;
    Ok(session_response(&state, jar, token))
}

async fn login_totp(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<TotpLoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>)> {
    payload.validate()?;
    let token = state
        .accounts
        .login_with_totp(&payload.email, &payload.password, &payload.otp)
        .await?;
    Ok(session_response(&state, jar, token))
}

/// Clear the session cookie. Bearer-token clients just drop the token.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

/// Return the token in the body and as an HTTP-only cookie.
fn session_response(
    state: &AppState,
    jar: CookieJar,
    token: String,
) -> (CookieJar, Json<TokenResponse>) {
    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.frontend_url.starts_with("https://"));

    (
        jar.add(cookie),
        Json(TokenResponse {
            access_token: token,
            token_type: "bearer".to_string(),
        }),
    )
}

// ─── Password reset ──────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmPasswordResetRequest {
    #[validate(email)]
    pub email: String,
    pub code: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>> {
    payload.validate()?;
    state.accounts.request_password_reset(&payload.email).await?;
    Ok(MessageResponse::new(
        "Password reset email sent if user exists.",
    ))
}

async fn confirm_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConfirmPasswordResetRequest>,
) -> Result<Json<MessageResponse>> {
    payload.validate()?;
    state
        .accounts
        .confirm_password_reset(&payload.email, &payload.code, &payload.new_password)
        .await?;
    Ok(MessageResponse::new("Password has been reset successfully."))
}
