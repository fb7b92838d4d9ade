// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard route.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::services::leaderboard::{self, LeaderboardEntry, DEFAULT_LIMIT};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/leaderboards/top-scores", get(top_scores))
}

#[derive(Debug, Deserialize)]
pub struct TopScoresParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

async fn top_scores(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopScoresParams>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    Ok(Json(leaderboard::top_scores(&state.db, limit).await?))
}
