// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity score leaderboard.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::Db;
use crate::error::AppError;
use crate::models::{activity_score, User};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub score: f64,
}

/// Top `limit` users by score.
pub async fn top_scores(db: &Db, limit: usize) -> Result<Vec<LeaderboardEntry>, AppError> {
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }
    let users = db.list_users().await?;
    Ok(rank(users, limit))
}

/// Highest score first. Equal scores keep account creation order.
pub fn rank(mut users: Vec<User>, limit: usize) -> Vec<LeaderboardEntry> {
    users.sort_by_key(|u| u.created_at);

    let mut entries: Vec<LeaderboardEntry> = users
        .into_iter()
        .map(|u| LeaderboardEntry {
            score: activity_score(&u.tracked_activities),
            user_id: u.user_id,
            name: u.name,
            email: u.email,
        })
        .collect();

    // Stable sort, so ties stay in creation order.
    entries.sort_by(|a, b| b.score.total_cmp(&a.score));
    entries.truncate(limit);
    entries
}
