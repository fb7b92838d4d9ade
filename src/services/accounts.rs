// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account flows: signup, two-step login and password reset.
//!
//! Login and reset never reveal whether an email is registered: an unknown
//! email and a wrong password produce the same error, and reset requests are
//! always acknowledged.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::db::locks::email_key;
use crate::db::{Db, KeyedLocks};
use crate::error::AppError;
use crate::middleware::auth::create_jwt;
use crate::models::{normalize_email, User};
use crate::services::credentials::{self, MIN_PASSWORD_LEN};
use crate::services::modify_user;
use crate::services::notifier::{Notification, NotificationDispatcher};
use crate::services::totp;
use crate::services::verification::{CodePurpose, VerificationCodeStore};

/// Fields accepted at signup.
#[derive(Debug, Clone)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub gender: Option<String>,
    pub age: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SignupOutcome {
    pub user: User,
    pub otp_provisioning_uri: String,
}

/// Editable profile fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub fitness_goals: Option<Vec<String>>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.gender.is_none()
            && self.age.is_none()
            && self.fitness_goals.is_none()
    }
}

/// Parameters for token issuance and hashing.
#[derive(Clone)]
pub struct AccountSettings {
    pub bcrypt_cost: u32,
    pub jwt_signing_key: Vec<u8>,
    pub access_token_ttl_minutes: i64,
}

#[derive(Clone)]
pub struct AccountService {
    db: Db,
    locks: KeyedLocks,
    codes: Arc<VerificationCodeStore>,
    notifier: NotificationDispatcher,
    settings: AccountSettings,
    /// Hash at the configured cost, checked when the email is unknown.
    dummy_hash: Arc<OnceCell<String>>,
}

/// Never a real password; only its hash is ever compared against.
const DUMMY_PASSWORD: &str = "sportify-unknown-account";

impl AccountService {
    pub fn new(
        db: Db,
        locks: KeyedLocks,
        codes: Arc<VerificationCodeStore>,
        notifier: NotificationDispatcher,
        settings: AccountSettings,
    ) -> Self {
        Self {
            db,
            locks,
            codes,
            notifier,
            settings,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Create an account and provision its authenticator secret.
    pub async fn signup(&self, input: SignupInput) -> Result<SignupOutcome, AppError> {
        let email = normalize_email(&input.email);
        check_password_strength(&input.password)?;

        // Serializes concurrent signups for one address through the uniqueness check.
        let _email_guard = self.locks.lock(&email_key(&email)).await;

        if self.db.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let hashed = credentials::hash_password(&input.password, self.settings.bcrypt_cost).await?;
        let mut user = User::new(&input.name, &email, hashed);
        user.gender = input.gender;
        user.age = input.age;

        let secret = totp::provision_secret();
        let otp_provisioning_uri = totp::provisioning_uri(&user.email, &secret)?;
        user.two_fa_key = Some(secret);
        user.is_2fa_enabled = true;

        self.db.upsert_user(&user).await?;
        tracing::info!(user_id = %user.user_id, "Created user account");

        Ok(SignupOutcome {
            user,
            otp_provisioning_uri,
        })
    }

    /// Step one of login: check the password and email a one-time code.
    pub async fn begin_login(&self, email: &str, password: &str) -> Result<(), AppError> {
        let user = self.check_password(email, password).await?;

        if !user.is_2fa_enabled {
            return Err(AppError::BadRequest(
                "2FA is not enabled for this account".to_string(),
            ));
        }

        let code = self.codes.issue(&user.email, CodePurpose::LoginTwoFactor)?;
        self.notifier.dispatch(Notification::LoginCode {
            to: user.email.clone(),
            code,
        });
        tracing::info!(user_id = %user.user_id, "Login code issued");
        Ok(())
    }

    /// Step two of login: trade a valid emailed code for a session token.
    pub async fn complete_login(&self, email: &str, code: &str) -> Result<String, AppError> {
        let email = normalize_email(email);
        if !self.codes.verify(&email, code, CodePurpose::LoginTwoFactor) {
            return Err(AppError::InvalidCode);
        }

        let user = self
            .db
            .get_user_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCode)?;

        tracing::info!(user_id = %user.user_id, "Login completed with emailed code");
        self.issue_token(&user)
    }

    /// Single-step login with password and an authenticator app code.
    pub async fn login_with_totp(
        &self,
        email: &str,
        password: &str,
        otp: &str,
    ) -> Result<String, AppError> {
        let user = self.check_password(email, password).await?;

        let secret = match (&user.two_fa_key, user.is_2fa_enabled) {
            (Some(secret), true) => secret,
            _ => {
                return Err(AppError::BadRequest(
                    "2FA is not enabled for this account".to_string(),
                ))
            }
        };
        if !totp::verify(secret, otp) {
            return Err(AppError::InvalidCode);
        }

        tracing::info!(user_id = %user.user_id, "Login completed with authenticator code");
        self.issue_token(&user)
    }

    /// Email a reset code if the account exists. Always succeeds for callers.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let email = normalize_email(email);
        match self.db.get_user_by_email(&email).await? {
            Some(user) => {
                let code = self.codes.issue(&user.email, CodePurpose::PasswordReset)?;
                self.notifier.dispatch(Notification::PasswordResetCode {
                    to: user.email.clone(),
                    code,
                });
                tracing::info!(user_id = %user.user_id, "Password reset code issued");
            }
            None => tracing::debug!("Password reset requested for unknown email"),
        }
        Ok(())
    }

    /// Replace the password if `code` is a valid reset code for `email`.
    pub async fn confirm_password_reset(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        // Validate first so a weak password does not burn the code.
        check_password_strength(new_password)?;

        let email = normalize_email(email);
        if !self.codes.verify(&email, code, CodePurpose::PasswordReset) {
            return Err(AppError::InvalidCode);
        }

        let user_id = self
            .db
            .get_user_by_email(&email)
            .await?
            .map(|u| u.user_id)
            .ok_or(AppError::InvalidCode)?;

        let hashed = credentials::hash_password(new_password, self.settings.bcrypt_cost).await?;
        let user = modify_user(&self.db, &self.locks, &user_id, |user| {
            user.hashed_password = hashed;
            Ok(())
        })
        .await?;
        // A login started with the old password must not complete.
        self.codes.invalidate(&email, CodePurpose::LoginTwoFactor);

        tracing::info!(user_id = %user.user_id, "Password reset completed");
        Ok(())
    }

    /// Apply profile edits. An empty change set is rejected.
    pub async fn update_profile(
        &self,
        user_id: &str,
        changes: ProfileChanges,
    ) -> Result<User, AppError> {
        if changes.is_empty() {
            return Err(AppError::BadRequest("No update data provided".to_string()));
        }
        if let Some(name) = &changes.name {
            if name.trim().is_empty() {
                return Err(AppError::BadRequest("Name cannot be empty".to_string()));
            }
        }

        let user = modify_user(&self.db, &self.locks, user_id, |user| {
            if let Some(name) = changes.name {
                user.name = name.trim().to_string();
            }
            if let Some(gender) = changes.gender {
                user.gender = Some(gender);
            }
            if let Some(age) = changes.age {
                user.age = Some(age);
            }
            if let Some(goals) = changes.fitness_goals {
                user.fitness_goals = goals;
            }
            Ok(())
        })
        .await?;

        tracing::info!(user_id, "Updated profile");
        Ok(user)
    }

    pub async fn set_notification_setting(
        &self,
        user_id: &str,
        enabled: bool,
    ) -> Result<User, AppError> {
        let user = modify_user(&self.db, &self.locks, user_id, |user| {
            user.notification_setting = enabled;
            Ok(())
        })
        .await?;
        tracing::info!(user_id, enabled, "Updated notification setting");
        Ok(user)
    }

    async fn check_password(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = normalize_email(email);
        let Some(user) = self.db.get_user_by_email(&email).await? else {
            // Pay the same bcrypt cost as a wrong password.
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| {
                    credentials::hash_password(DUMMY_PASSWORD, self.settings.bcrypt_cost)
                })
                .await?;
            credentials::verify_password(password, dummy).await;
            return Err(AppError::InvalidCredentials);
        };

        if !credentials::verify_password(password, &user.hashed_password).await {
            tracing::info!(user_id = %user.user_id, "Password check failed");
            return Err(AppError::InvalidCredentials);
        }
        Ok(user)
    }

    fn issue_token(&self, user: &User) -> Result<String, AppError> {
        Ok(create_jwt(
            &user.email,
            &self.settings.jwt_signing_key,
            self.settings.access_token_ttl_minutes,
        )?)
    }
}

fn check_password_strength(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
