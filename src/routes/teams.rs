// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group activity team routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{GroupActivityTeam, NewTeam, TeamChanges, TeamStatus};
use crate::time_utils::parse_utc_rfc3339;
use crate::AppState;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/activity-teams", get(list_teams))
}

/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/activity-teams", post(create_team))
        .route(
            "/activity-teams/{team_id}",
            put(update_team).delete(delete_team),
        )
        .route("/activity-teams/{team_id}/bookings", post(book_team))
}

/// Teams currently accepting bookings.
async fn list_teams(State(state): State<Arc<AppState>>) -> Result<Json<Vec<GroupActivityTeam>>> {
    Ok(Json(state.bookings.list_active().await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub location: String,
    /// RFC3339; any offset is normalized to UTC
    pub date_and_time: String,
    pub age_range: Option<String>,
    #[validate(length(min = 1))]
    pub contact_information: String,
    #[validate(range(min = 1))]
    pub players_needed: u32,
    pub photo_url: Option<String>,
}

async fn create_team(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<GroupActivityTeam>)> {
    payload.validate()?;
    let date_and_time = parse_utc_rfc3339(&payload.date_and_time, "date_and_time")?;

    let team = state
        .bookings
        .create(
            &user.user_id,
            NewTeam {
                name: payload.name,
                description: payload.description,
                category: payload.category,
                location: payload.location,
                date_and_time,
                age_range: payload.age_range,
                contact_information: payload.contact_information,
                players_needed: payload.players_needed,
                photo_url: payload.photo_url,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// Partial team update. Absent fields are left alone.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTeamRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
    #[validate(length(min = 1))]
    pub location: Option<String>,
    pub date_and_time: Option<String>,
    pub age_range: Option<String>,
    #[validate(length(min = 1))]
    pub contact_information: Option<String>,
    #[validate(range(min = 1))]
    pub players_needed: Option<u32>,
    pub status: Option<TeamStatus>,
    pub photo_url: Option<String>,
}

async fn update_team(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(team_id): Path<String>,
    Json(payload): Json<UpdateTeamRequest>,
) -> Result<Json<GroupActivityTeam>> {
    payload.validate()?;
    let date_and_time = payload
        .date_and_time
        .as_deref()
        .map(|raw| parse_utc_rfc3339(raw, "date_and_time"))
        .transpose()?;

    let changes = TeamChanges {
        name: payload.name,
        description: payload.description,
        category: payload.category,
        location: payload.location,
        date_and_time,
        age_range: payload.age_range,
        contact_information: payload.contact_information,
        players_needed: payload.players_needed,
        status: payload.status,
        photo_url: payload.photo_url,
    };

    let team = state
        .bookings
        .edit(&team_id, &user.user_id, changes)
        .await?;
    Ok(Json(team))
}

async fn delete_team(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(team_id): Path<String>,
) -> Result<StatusCode> {
    state.bookings.delete(&team_id, &user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn book_team(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(team_id): Path<String>,
) -> Result<Json<GroupActivityTeam>> {
    let team = state.bookings.enroll(&team_id, &user.user_id).await?;
    Ok(Json(team))
}
