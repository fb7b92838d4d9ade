// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Booking and capacity engine for group activity teams.
//!
//! Every mutation of a team happens under that team's keyed lock, so the
//! capacity check and the enrollment write are one atomic step. Count and
//! membership live in the same document and are written together.

use chrono::Utc;
use futures_util::{stream, StreamExt};

use crate::db::locks::{team_key, user_key};
use crate::db::{Db, KeyedLocks};
use crate::error::AppError;
use crate::models::{GroupActivityTeam, NewTeam, TeamChanges, TeamStatus, User};
use crate::services::modify_user;

const MAX_CONCURRENT_DB_OPS: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Activity team {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("Team is {0} and not accepting bookings")]
    InvalidState(TeamStatus),

    #[error("Team is already full")]
    CapacityExceeded,

    #[error("User is already booked for this team")]
    AlreadyEnrolled,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(_) => AppError::NotFound(err.to_string()),
            BookingError::Forbidden(msg) => AppError::Forbidden(msg.to_string()),
            BookingError::InvalidState(_)
            | BookingError::CapacityExceeded
            | BookingError::AlreadyEnrolled
            | BookingError::Conflict(_) => AppError::Conflict(err.to_string()),
            BookingError::Validation(msg) => AppError::BadRequest(msg),
            BookingError::Storage(e) => e,
        }
    }
}

#[derive(Clone)]
pub struct BookingService {
    db: Db,
    locks: KeyedLocks,
}

impl BookingService {
    pub fn new(db: Db, locks: KeyedLocks) -> Self {
        Self { db, locks }
    }

    pub async fn create(
        &self,
        lister_id: &str,
        fields: NewTeam,
    ) -> Result<GroupActivityTeam, BookingError> {
        if fields.players_needed < 1 {
            return Err(BookingError::Validation(
                "players_needed must be at least 1".to_string(),
            ));
        }

        let team = GroupActivityTeam {
            team_id: uuid::Uuid::new_v4().to_string(),
            lister_id: lister_id.to_string(),
            name: fields.name,
            description: fields.description,
            category: fields.category,
            location: fields.location,
            date_and_time: fields.date_and_time,
            age_range: fields.age_range,
            contact_information: fields.contact_information,
            players_needed: fields.players_needed,
            current_players_count: 0,
            players_enrolled: Vec::new(),
            status: TeamStatus::Active,
            photo_url: fields.photo_url,
            created_at: Utc::now(),
        };

        self.db.upsert_team(&team).await?;
        tracing::info!(
            team_id = %team.team_id,
            lister_id,
            capacity = team.players_needed,
            "Created activity team"
        );
        Ok(team)
    }

    /// Add `user_id` to a team.
    ///
    /// Checks run in a fixed order so the reported reason is deterministic:
    /// existence, lister, cancelled, capacity, remaining status, duplicate.
    pub async fn enroll(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<GroupActivityTeam, BookingError> {
        let _team_guard = self.locks.lock(&team_key(team_id)).await;

        let mut team = self
            .db
            .get_team(team_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(team_id.to_string()))?;

        if team.lister_id == user_id {
            return Err(BookingError::Forbidden(
                "The lister cannot book their own activity team",
            ));
        }
        if team.status == TeamStatus::Cancelled {
            return Err(BookingError::InvalidState(team.status));
        }
        // A full team reports capacity whether or not it has been marked filled.
        if team.is_full() {
            return Err(BookingError::CapacityExceeded);
        }
        if team.status != TeamStatus::Active {
            return Err(BookingError::InvalidState(team.status));
        }
        if team.is_enrolled(user_id) {
            return Err(BookingError::AlreadyEnrolled);
        }

        let previous = team.clone();
        team.players_enrolled.push(user_id.to_string());
        team.current_players_count += 1;
        if team.is_full() {
            team.status = TeamStatus::Filled;
        }
        self.db.upsert_team(&team).await?;

        if let Err(e) = self.record_booking(user_id, team_id).await {
            tracing::error!(team_id, user_id, error = %e, "Failed to record booking on user, reverting");
            if let Err(revert) = self.db.upsert_team(&previous).await {
                tracing::error!(team_id, error = %revert, "Failed to revert team after booking failure");
            }
            return Err(e);
        }

        tracing::info!(
            team_id,
            user_id,
            count = team.current_players_count,
            capacity = team.players_needed,
            status = %team.status,
            "Enrolled user in team"
        );
        Ok(team)
    }

    async fn record_booking(&self, user_id: &str, team_id: &str) -> Result<(), BookingError> {
        modify_user(&self.db, &self.locks, user_id, |user| {
            if !user.bookings.iter().any(|id| id == team_id) {
                user.bookings.push(team_id.to_string());
            }
            Ok(())
        })
        .await?;
        Ok(())
    }

    /// Apply a lister's partial update.
    pub async fn edit(
        &self,
        team_id: &str,
        requester_id: &str,
        changes: TeamChanges,
    ) -> Result<GroupActivityTeam, BookingError> {
        let _team_guard = self.locks.lock(&team_key(team_id)).await;

        let mut team = self
            .db
            .get_team(team_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(team_id.to_string()))?;

        if team.lister_id != requester_id {
            return Err(BookingError::Forbidden(
                "Not authorized to edit this activity team",
            ));
        }
        if changes.is_empty() {
            return Err(BookingError::Validation("No update data provided".to_string()));
        }

        if let Some(capacity) = changes.players_needed {
            if capacity < 1 {
                return Err(BookingError::Validation(
                    "players_needed must be at least 1".to_string(),
                ));
            }
            if capacity < team.current_players_count {
                return Err(BookingError::Conflict(format!(
                    "players_needed ({}) is below the current player count ({})",
                    capacity, team.current_players_count
                )));
            }
            team.players_needed = capacity;
        }
        if let Some(status) = changes.status {
            if !team.status.can_transition_to(status) {
                return Err(BookingError::Conflict(format!(
                    "Cannot change team status from {} to {}",
                    team.status, status
                )));
            }
            team.status = status;
        }

        if let Some(name) = changes.name {
            team.name = name;
        }
        if let Some(description) = changes.description {
            team.description = description;
        }
        if let Some(category) = changes.category {
            team.category = category;
        }
        if let Some(location) = changes.location {
            team.location = location;
        }
        if let Some(when) = changes.date_and_time {
            team.date_and_time = when;
        }
        if let Some(age_range) = changes.age_range {
            team.age_range = Some(age_range);
        }
        if let Some(contact) = changes.contact_information {
            team.contact_information = contact;
        }
        if let Some(photo_url) = changes.photo_url {
            team.photo_url = Some(photo_url);
        }

        if team.status == TeamStatus::Active && team.is_full() {
            team.status = TeamStatus::Filled;
        }

        self.db.upsert_team(&team).await?;
        tracing::info!(team_id, status = %team.status, "Updated activity team");
        Ok(team)
    }

    /// Delete a team and detach it from its players' bookings.
    pub async fn delete(&self, team_id: &str, requester_id: &str) -> Result<(), BookingError> {
        let _team_guard = self.locks.lock(&team_key(team_id)).await;

        let team = self
            .db
            .get_team(team_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(team_id.to_string()))?;

        if team.lister_id != requester_id {
            return Err(BookingError::Forbidden(
                "Not authorized to delete this activity team",
            ));
        }

        self.db.delete_team(team_id).await?;

        let failures = stream::iter(team.players_enrolled.clone())
            .map(|user_id| {
                let this = self.clone();
                let team_id = team_id.to_string();
                async move {
                    let result = this.remove_booking(&user_id, &team_id).await;
                    if let Err(e) = &result {
                        tracing::warn!(user_id = %user_id, team_id = %team_id, error = %e, "Failed to detach booking");
                    }
                    result.is_err()
                }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .filter(|failed| futures_util::future::ready(*failed))
            .count()
            .await;

        if failures > 0 {
            tracing::warn!(team_id, failures, "Some bookings could not be detached from users");
        }
        tracing::info!(team_id, players = team.players_enrolled.len(), "Deleted activity team");
        Ok(())
    }

    async fn remove_booking(&self, user_id: &str, team_id: &str) -> Result<(), AppError> {
        let _user_guard = self.locks.lock(&user_key(user_id)).await;

        let Some(mut user) = self.db.get_user(user_id).await? else {
            return Ok(());
        };
        user.bookings.retain(|id| id != team_id);
        self.db.upsert_user(&user).await
    }

    /// Teams currently accepting bookings.
    pub async fn list_active(&self) -> Result<Vec<GroupActivityTeam>, BookingError> {
        let teams = self
            .db
            .query(crate::db::collections::TEAMS, |t: &GroupActivityTeam| {
                t.status == TeamStatus::Active
            })
            .await?;
        Ok(teams)
    }

    /// Teams the user is booked into. Stale ids are skipped.
    pub async fn bookings_for(&self, user: &User) -> Result<Vec<GroupActivityTeam>, BookingError> {
        let mut teams = Vec::with_capacity(user.bookings.len());
        for team_id in &user.bookings {
            if let Some(team) = self.db.get_team(team_id).await? {
                teams.push(team);
            }
        }
        Ok(teams)
    }
}
