// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticator-app codes (RFC 6238): SHA1, 6 digits, 30 second step,
//! one step of clock skew either way.

use totp_rs::{Algorithm, Secret, TOTP};

use crate::config::TOTP_ISSUER;
use crate::error::AppError;

const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP_SECONDS: u64 = 30;

/// Generate a new 160-bit secret, base32 encoded.
pub fn provision_secret() -> String {
    Secret::generate_secret().to_encoded().to_string()
}

/// `otpauth://` URI for enrolling the secret in an authenticator app.
pub fn provisioning_uri(email: &str, secret: &str) -> Result<String, AppError> {
    Ok(build(secret, email)?.get_url())
}

/// Check a code against the current time.
pub fn verify(secret: &str, code: &str) -> bool {
    match build(secret, "") {
        Ok(totp) => totp.check_current(code.trim()).unwrap_or(false),
        Err(e) => {
            tracing::warn!(error = %e, "Stored TOTP secret is unusable");
            false
        }
    }
}

/// Check a code at a given Unix time.
pub fn verify_at(secret: &str, code: &str, unix_seconds: u64) -> bool {
    build(secret, "")
        .map(|totp| totp.check(code.trim(), unix_seconds))
        .unwrap_or(false)
}

fn build(secret: &str, account: &str) -> Result<TOTP, AppError> {
    let bytes = Secret::Encoded(secret.to_string())
        .to_bytes()
        .map_err(|e| anyhow::anyhow!("Invalid TOTP secret: {:?}", e))?;

    TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        SKEW,
        STEP_SECONDS,
        bytes,
        Some(TOTP_ISSUER.to_string()),
        account.to_string(),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid TOTP parameters: {}", e)))
}
