// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod activity;
pub mod booking;
pub mod coach;
pub mod credentials;
pub mod gyms;
pub mod leaderboard;
pub mod notifier;
pub mod totp;
pub mod verification;

pub use accounts::AccountService;
pub use activity::ActivityService;
pub use booking::{BookingError, BookingService};
pub use coach::CoachClient;
pub use gyms::{CatalogError, GymCatalog, GymService};
pub use notifier::{EmailSender, LogEmailSender, NotificationDispatcher, SmtpEmailSender};
pub use verification::{CodePurpose, VerificationCodeStore};

use crate::db::locks::user_key;
use crate::db::{Db, KeyedLocks};
use crate::error::AppError;
use crate::models::User;

/// Read-modify-write a user document under the user's lock.
///
/// `update` may reject the change, in which case nothing is written.
pub(crate) async fn modify_user<F>(
    db: &Db,
    locks: &KeyedLocks,
    user_id: &str,
    update: F,
) -> Result<User, AppError>
where
    F: FnOnce(&mut User) -> Result<(), AppError>,
{
    let _user_guard = locks.lock(&user_key(user_id)).await;

    let mut user = db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    update(&mut user)?;
    db.upsert_user(&user).await?;
    Ok(user)
}
