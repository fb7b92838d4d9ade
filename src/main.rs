// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sportify API Server
//!
//! Fitness tracking backend: accounts with 2FA, activity scoring, gyms,
//! bookable group activity teams, a leaderboard and an AI coach.

use sportify_api::{
    config::Config,
    db::Db,
    services::{EmailSender, GymCatalog, LogEmailSender, SmtpEmailSender},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.database_backend,
        "Starting Sportify API"
    );

    let db = Db::connect(&config).await?;

    let email_sender: Arc<dyn EmailSender> = match &config.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "SMTP delivery enabled");
            Arc::new(SmtpEmailSender::new(smtp, &config.mail_from)?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, verification emails will only be logged");
            Arc::new(LogEmailSender)
        }
    };

    // The API still serves everything but gyms without a catalog.
    tracing::info!(path = %config.gym_catalog_path, "Loading gym catalog");
    match GymCatalog::load_from_file(&config.gym_catalog_path) {
        Ok(catalog) => {
            let count = catalog.seed(&db).await?;
            tracing::info!(count, "Gym catalog seeded");
        }
        Err(e) => {
            tracing::warn!(path = %config.gym_catalog_path, error = %e, "Gym catalog not loaded")
        }
    }

    if config.coach_api_key.is_none() {
        tracing::warn!("COACH_API_KEY not set, AI coach requests will return 503");
    }

    // Build shared state
    let port = config.port;
    let state = Arc::new(AppState::new(config, db, email_sender));

    // Build router
    let app = sportify_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sportify_api=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
