// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes for the authenticated user's own account.

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityKind, ActivityTotals, User};
use crate::services::accounts::ProfileChanges;
use crate::services::activity::LogOutcome;
use crate::time_utils::parse_date_or_today;
use crate::AppState;

/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/me/profile", put(update_profile))
        .route("/users/me/activity-tracking", get(get_activity_tracking))
        .route("/users/me/activity-log", post(log_activity))
        .route("/users/me/activity-log/running", post(log_running))
        .route("/users/me/activity-log/steps", post(log_steps))
        .route("/users/me/activity-log/gym-time", post(log_gym_time))
        .route(
            "/users/me/favourites/{gym_id}",
            post(add_favourite).delete(remove_favourite),
        )
        .route("/users/me/notification-settings", put(set_notifications))
        .route("/users/me/bookings", get(get_bookings))
        .route("/users/me/achievements", get(get_achievements))
}

async fn load_user(state: &AppState, auth: &AuthUser) -> Result<User> {
    state
        .db
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response. Credentials and the TOTP secret never leave the server.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub fitness_goals: Vec<String>,
    pub is_2fa_enabled: bool,
    pub favourites: Vec<String>,
    pub achievements: Vec<String>,
    pub notification_setting: bool,
    pub bookings: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            gender: user.gender,
            age: user.age,
            fitness_goals: user.fitness_goals,
            is_2fa_enabled: user.is_2fa_enabled,
            favourites: user.favourites,
            achievements: user.achievements,
            notification_setting: user.notification_setting,
            bookings: user.bookings,
            created_at: user.created_at,
        }
    }
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    Ok(Json(load_user(&state, &auth).await?.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub gender: Option<String>,
    #[validate(range(min = 1, max = 120))]
    pub age: Option<u32>,
    pub fitness_goals: Option<Vec<String>>,
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>> {
    payload.validate()?;
    let user = state
        .accounts
        .update_profile(
            &auth.user_id,
            ProfileChanges {
                name: payload.name,
                gender: payload.gender,
                age: payload.age,
                fitness_goals: payload.fitness_goals,
            },
        )
        .await?;
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize)]
pub struct NotificationSettingsRequest {
    pub enabled: bool,
}

async fn set_notifications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<NotificationSettingsRequest>,
) -> Result<Json<UserResponse>> {
    let user = state
        .accounts
        .set_notification_setting(&auth.user_id, payload.enabled)
        .await?;
    Ok(Json(user.into()))
}

// ─── Activity ────────────────────────────────────────────────

async fn get_activity_tracking(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ActivityTotals>> {
    let user = load_user(&state, &auth).await?;
    Ok(Json(ActivityTotals::from_logs(&user.tracked_activities)))
}

/// Generic log entry. `date` defaults to today.
#[derive(Debug, Deserialize)]
pub struct ActivityLogRequest {
    pub date: Option<String>,
    pub activity_type: ActivityKind,
    pub value: f64,
}

/// Kind-specific log entry; the kind comes from the path.
#[derive(Debug, Deserialize)]
pub struct ActivityValueRequest {
    pub date: Option<String>,
    pub value: f64,
}

async fn record(
    state: &AppState,
    auth: &AuthUser,
    date: Option<&str>,
    kind: ActivityKind,
    value: f64,
) -> Result<Json<LogOutcome>> {
    let date: NaiveDate = parse_date_or_today(date)?;
    let outcome = state.activity.log(&auth.user_id, date, kind, value).await?;
    Ok(Json(outcome))
}

async fn log_activity(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ActivityLogRequest>,
) -> Result<Json<LogOutcome>> {
    record(
        &state,
        &auth,
        payload.date.as_deref(),
        payload.activity_type,
        payload.value,
    )
    .await
}

async fn log_running(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ActivityValueRequest>,
) -> Result<Json<LogOutcome>> {
    record(&state, &auth, payload.date.as_deref(), ActivityKind::Running, payload.value).await
}

async fn log_steps(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ActivityValueRequest>,
) -> Result<Json<LogOutcome>> {
    record(&state, &auth, payload.date.as_deref(), ActivityKind::Steps, payload.value).await
}

async fn log_gym_time(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ActivityValueRequest>,
) -> Result<Json<LogOutcome>> {
    record(&state, &auth, payload.date.as_deref(), ActivityKind::GymTime, payload.value).await
}

// ─── Favourites ──────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FavouritesResponse {
    pub favourites: Vec<String>,
}

async fn add_favourite(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(gym_id): Path<String>,
) -> Result<Json<FavouritesResponse>> {
    let favourites = state.gyms.add_favourite(&auth.user_id, &gym_id).await?;
    Ok(Json(FavouritesResponse { favourites }))
}

async fn remove_favourite(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(gym_id): Path<String>,
) -> Result<Json<FavouritesResponse>> {
    let favourites = state.gyms.remove_favourite(&auth.user_id, &gym_id).await?;
    Ok(Json(FavouritesResponse { favourites }))
}

// ─── Bookings & achievements ─────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BookingResponse {
    pub team_id: String,
    pub team_name: String,
    pub activity_date_time: DateTime<Utc>,
    pub location: String,
}

async fn get_bookings(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<BookingResponse>>> {
    let user = load_user(&state, &auth).await?;
    let teams = state.bookings.bookings_for(&user).await?;
    Ok(Json(
        teams
            .into_iter()
            .map(|team| BookingResponse {
                team_id: team.team_id,
                team_name: team.name,
                activity_date_time: team.date_and_time,
                location: team.location,
            })
            .collect(),
    ))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AchievementResponse {
    pub name: String,
}

async fn get_achievements(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<AchievementResponse>>> {
    let user = load_user(&state, &auth).await?;
    Ok(Json(
        user.achievements
            .into_iter()
            .map(|name| AchievementResponse { name })
            .collect(),
    ))
}
