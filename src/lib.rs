// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Sportify: fitness tracking backend.
//!
//! This crate provides the HTTP API for accounts with emailed and
//! authenticator-app 2FA, activity logging and scoring, gym lookup, bookable
//! group activity teams, a leaderboard and an AI coach.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::{Db, KeyedLocks};
use services::accounts::AccountSettings;
use services::{
    AccountService, ActivityService, BookingService, CoachClient, EmailSender, GymService,
    NotificationDispatcher, VerificationCodeStore,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub codes: Arc<VerificationCodeStore>,
    pub accounts: AccountService,
    pub activity: ActivityService,
    pub bookings: BookingService,
    pub gyms: GymService,
    pub coach: CoachClient,
}

impl AppState {
    /// Wire up services over `db`. Spawns the notification worker, so this
    /// must run inside a tokio runtime.
    pub fn new(config: Config, db: Db, email_sender: Arc<dyn EmailSender>) -> Self {
        let locks = KeyedLocks::new();
        let codes = Arc::new(VerificationCodeStore::new(chrono::Duration::minutes(
            config.verification_code_ttl_minutes,
        )));
        let notifier =
            NotificationDispatcher::spawn(email_sender, config.verification_code_ttl_minutes);

        let accounts = AccountService::new(
            db.clone(),
            locks.clone(),
            codes.clone(),
            notifier,
            AccountSettings {
                bcrypt_cost: config.bcrypt_cost,
                jwt_signing_key: config.jwt_signing_key.clone(),
                access_token_ttl_minutes: config.access_token_ttl_minutes,
            },
        );
        let coach = CoachClient::new(
            config.coach_api_url.clone(),
            config.coach_model.clone(),
            config.coach_api_key.clone(),
        );

        Self {
            activity: ActivityService::new(db.clone(), locks.clone()),
            bookings: BookingService::new(db.clone(), locks.clone()),
            gyms: GymService::new(db.clone(), locks),
            accounts,
            coach,
            codes,
            db,
            config,
        }
    }
}
