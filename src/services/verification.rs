// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Short-lived, single-use verification codes.
//!
//! Codes are emailed to a user to authorize one sensitive action. Each
//! (email, purpose) pair holds at most one pending code; issuing again
//! replaces it. A code is consumed by the first successful verification.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::models::normalize_email;

const CODE_SPACE: u32 = 1_000_000;

/// What a code authorizes. Codes never cross purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodePurpose {
    LoginTwoFactor,
    PasswordReset,
}

impl CodePurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            CodePurpose::LoginTwoFactor => "login_2fa",
            CodePurpose::PasswordReset => "password_reset",
        }
    }
}

#[derive(Debug, Clone)]
struct PendingCode {
    code: String,
    expires_at: DateTime<Utc>,
}

/// In-memory store of pending codes keyed by (normalized email, purpose).
pub struct VerificationCodeStore {
    codes: DashMap<(String, CodePurpose), PendingCode>,
    ttl: Duration,
    rng: SystemRandom,
}

impl VerificationCodeStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            codes: DashMap::new(),
            ttl,
            rng: SystemRandom::new(),
        }
    }

    /// Issue a new code, replacing any pending one for the same slot.
    pub fn issue(&self, email: &str, purpose: CodePurpose) -> Result<String, AppError> {
        self.issue_at(email, purpose, Utc::now())
    }

    pub fn issue_at(
        &self,
        email: &str,
        purpose: CodePurpose,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let code = self.random_code()?;
        self.codes.insert(
            (normalize_email(email), purpose),
            PendingCode {
                code: code.clone(),
                expires_at: now + self.ttl,
            },
        );
        tracing::debug!(purpose = purpose.as_str(), "Issued verification code");
        Ok(code)
    }

    /// Check a code and consume it on success.
    ///
    /// Wrong code, wrong purpose, expired or missing all return false.
    pub fn verify(&self, email: &str, code: &str, purpose: CodePurpose) -> bool {
        self.verify_at(email, code, purpose, Utc::now())
    }

    pub fn verify_at(
        &self,
        email: &str,
        code: &str,
        purpose: CodePurpose,
        now: DateTime<Utc>,
    ) -> bool {
        let key = (normalize_email(email), purpose);
        // Check and removal happen under the same shard lock.
        let consumed = self.codes.remove_if(&key, |_, pending| {
            now < pending.expires_at && bool::from(pending.code.as_bytes().ct_eq(code.as_bytes()))
        });

        if consumed.is_none() {
            tracing::debug!(purpose = purpose.as_str(), "Verification code rejected");
        }
        consumed.is_some()
    }

    pub fn invalidate(&self, email: &str, purpose: CodePurpose) {
        self.codes.remove(&(normalize_email(email), purpose));
    }

    /// Uniform 6-digit code via rejection sampling.
    fn random_code(&self) -> Result<String, AppError> {
        let limit = u32::MAX - u32::MAX % CODE_SPACE;
        loop {
            let mut buf = [0u8; 4];
            self.rng
                .fill(&mut buf)
                .map_err(|_| anyhow::anyhow!("System RNG failure"))?;
            let n = u32::from_le_bytes(buf);
            if n < limit {
                return Ok(format!("{:06}", n % CODE_SPACE));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VerificationCodeStore {
        VerificationCodeStore::new(Duration::minutes(10))
    }

    #[test]
    fn test_code_is_six_digits() {
        let store = store();
        for _ in 0..50 {
            let code = store.issue("a@example.com", CodePurpose::LoginTwoFactor).unwrap();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_code_is_single_use() {
        let store = store();
        let code = store.issue("a@example.com", CodePurpose::LoginTwoFactor).unwrap();

        assert!(store.verify("a@example.com", &code, CodePurpose::LoginTwoFactor));
        assert!(!store.verify("a@example.com", &code, CodePurpose::LoginTwoFactor));
    }

    #[test]
    fn test_wrong_purpose_rejected() {
        let store = store();
        let code = store.issue("a@example.com", CodePurpose::LoginTwoFactor).unwrap();

        assert!(!store.verify("a@example.com", &code, CodePurpose::PasswordReset));
        // Still usable for its own purpose.
        assert!(store.verify("a@example.com", &code, CodePurpose::LoginTwoFactor));
    }

    #[test]
    fn test_wrong_code_does_not_consume() {
        let store = store();
        let code = store.issue("a@example.com", CodePurpose::PasswordReset).unwrap();
        let wrong = if code == "000000" { "000001" } else { "000000" };

        assert!(!store.verify("a@example.com", wrong, CodePurpose::PasswordReset));
        assert!(!store.verify("a@example.com", "12345", CodePurpose::PasswordReset));
        assert!(store.verify("a@example.com", &code, CodePurpose::PasswordReset));
    }

    #[test]
    fn test_expired_code_rejected() {
        let store = store();
        let issued = Utc::now();
        let code = store
            .issue_at("a@example.com", CodePurpose::LoginTwoFactor, issued)
            .unwrap();

        let at_expiry = issued + Duration::minutes(10);
        assert!(!store.verify_at("a@example.com", &code, CodePurpose::LoginTwoFactor, at_expiry));

        let just_before = issued + Duration::minutes(10) - Duration::seconds(1);
        assert!(store.verify_at("a@example.com", &code, CodePurpose::LoginTwoFactor, just_before));
    }

    #[test]
    fn test_purposes_do_not_overwrite_each_other() {
        let store = store();
        let reset = store.issue("a@example.com", CodePurpose::PasswordReset).unwrap();
        let _login = store.issue("a@example.com", CodePurpose::LoginTwoFactor).unwrap();

        assert!(store.verify("a@example.com", &reset, CodePurpose::PasswordReset));
    }

    #[test]
    fn test_reissue_replaces_pending_code() {
        let store = store();
        let issued = Utc::now();
        let first = store
            .issue_at("a@example.com", CodePurpose::LoginTwoFactor, issued)
            .unwrap();
        let second = store
            .issue_at("a@example.com", CodePurpose::LoginTwoFactor, issued)
            .unwrap();

        if first != second {
            assert!(!store.verify_at("a@example.com", &first, CodePurpose::LoginTwoFactor, issued));
        }
        assert!(store.verify_at("a@example.com", &second, CodePurpose::LoginTwoFactor, issued));
    }

    #[test]
    fn test_email_is_normalized() {
        let store = store();
        let code = store.issue(" A@Example.com ", CodePurpose::LoginTwoFactor).unwrap();
        assert!(store.verify("a@example.com", &code, CodePurpose::LoginTwoFactor));
    }

    #[test]
    fn test_invalidate() {
        let store = store();
        let code = store.issue("a@example.com", CodePurpose::PasswordReset).unwrap();
        store.invalidate("a@example.com", CodePurpose::PasswordReset);
        assert!(!store.verify("a@example.com", &code, CodePurpose::PasswordReset));
    }
}
