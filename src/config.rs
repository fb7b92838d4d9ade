// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development. Only the JWT signing key
//! is mandatory; everything else has a development default.

use std::env;
use std::str::FromStr;

/// Default lifetime of emailed verification codes.
pub const DEFAULT_CODE_TTL_MINUTES: i64 = 10;

/// Default lifetime of session tokens.
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 60;

/// Issuer shown in authenticator apps.
pub const TOTP_ISSUER: &str = "SportifyApp";

/// Which document store backs the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Memory,
    Firestore,
}

impl FromStr for DatabaseBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "firestore" => Ok(Self::Firestore),
            _ => Err(ConfigError::Invalid("DATABASE_BACKEND")),
        }
    }
}

/// Outbound SMTP settings. Absent when mail is not configured.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Document store backend
    pub database_backend: DatabaseBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
    /// GeoJSON file with the gym catalog
    pub gym_catalog_path: String,
    /// Session token lifetime in minutes
    pub access_token_ttl_minutes: i64,
    /// Verification code lifetime in minutes
    pub verification_code_ttl_minutes: i64,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
    /// Sender address for outgoing mail
    pub mail_from: String,
    /// SMTP relay; `None` means emails are only logged
    pub smtp: Option<SmtpConfig>,
    /// OpenAI-compatible chat completions endpoint for the AI coach
    pub coach_api_url: String,
    /// Model name sent to the coach endpoint
    pub coach_model: String,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// API key for the AI coach; the coach is disabled without it
    pub coach_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpConfig {
                host: host.trim().to_string(),
                port: parse_or("SMTP_PORT", 587)?,
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD")
                    .map(|v| v.trim().to_string())
                    .unwrap_or_default(),
            }),
            _ => None,
        };

        let database_backend = env::var("DATABASE_BACKEND")
            .map(|v| v.parse())
            .unwrap_or(Ok(DatabaseBackend::Memory))?;

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_or("PORT", 8080)?,
            database_backend,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            gym_catalog_path: env::var("GYM_CATALOG_PATH")
                .unwrap_or_else(|_| "data/gyms.geojson".to_string()),
            access_token_ttl_minutes: parse_or(
                "ACCESS_TOKEN_EXPIRE_MINUTES",
                DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
            )?,
            verification_code_ttl_minutes: parse_or(
                "VERIFICATION_CODE_TTL_MINUTES",
                DEFAULT_CODE_TTL_MINUTES,
            )?,
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Sportify App <no-reply@sportify.local>".to_string()),
            smtp,
            coach_api_url: env::var("COACH_API_URL")
                .unwrap_or_else(|_| "https://api.deepseek.com/v1/chat/completions".to_string()),
            coach_model: env::var("COACH_MODEL").unwrap_or_else(|_| "deepseek-chat".to_string()),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            coach_api_key: env::var("COACH_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }

    /// Config for tests: in-memory store, cheap bcrypt, no SMTP, no coach.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            database_backend: DatabaseBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            gym_catalog_path: "data/gyms.geojson".to_string(),
            access_token_ttl_minutes: DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
            verification_code_ttl_minutes: DEFAULT_CODE_TTL_MINUTES,
            bcrypt_cost: 4,
            mail_from: "test@sportify.local".to_string(),
            smtp: None,
            coach_api_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            coach_model: "test-model".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            coach_api_key: None,
        }
    }
}

/// Parse an optional numeric env var, rejecting values that are set but malformed.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
