// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Group activity team (bookable session) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifecycle state of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum TeamStatus {
    Active,
    Filled,
    Cancelled,
}

impl TeamStatus {
    /// Whether a lister may move a team from `self` to `next`.
    pub fn can_transition_to(self, next: TeamStatus) -> bool {
        use TeamStatus::*;
        matches!(
            (self, next),
            (Active, Active)
                | (Active, Filled)
                | (Active, Cancelled)
                | (Filled, Filled)
                | (Filled, Cancelled)
                | (Cancelled, Cancelled)
        )
    }
}

impl std::fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TeamStatus::Active => "active",
            TeamStatus::Filled => "filled",
            TeamStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Stored team record in the `group_activity_teams` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GroupActivityTeam {
    /// UUID (also used as document ID)
    pub team_id: String,
    /// User who created and administers the team
    pub lister_id: String,
    pub name: String,
    pub description: String,
    /// e.g. "Yoga", "Running Club"
    pub category: String,
    pub location: String,
    pub date_and_time: DateTime<Utc>,
    #[serde(default)]
    pub age_range: Option<String>,
    pub contact_information: String,
    /// Capacity
    pub players_needed: u32,
    /// Always equal to `players_enrolled.len()`
    pub current_players_count: u32,
    pub players_enrolled: Vec<String>,
    pub status: TeamStatus,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GroupActivityTeam {
    pub fn is_full(&self) -> bool {
        self.current_players_count >= self.players_needed
    }

    pub fn is_enrolled(&self, user_id: &str) -> bool {
        self.players_enrolled.iter().any(|id| id == user_id)
    }

    /// Check the structural invariants of the record.
    pub fn invariants_hold(&self) -> bool {
        self.current_players_count as usize == self.players_enrolled.len()
            && self.current_players_count <= self.players_needed
            && !self.is_enrolled(&self.lister_id)
    }
}

/// Fields a lister supplies when creating a team.
#[derive(Debug, Clone)]
pub struct NewTeam {
    pub name: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub date_and_time: DateTime<Utc>,
    pub age_range: Option<String>,
    pub contact_information: String,
    pub players_needed: u32,
    pub photo_url: Option<String>,
}

/// Partial update of a team. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub date_and_time: Option<DateTime<Utc>>,
    pub age_range: Option<String>,
    pub contact_information: Option<String>,
    pub players_needed: Option<u32>,
    pub status: Option<TeamStatus>,
    pub photo_url: Option<String>,
}

impl TeamChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.location.is_none()
            && self.date_and_time.is_none()
            && self.age_range.is_none()
            && self.contact_information.is_none()
            && self.players_needed.is_none()
            && self.status.is_none()
            && self.photo_url.is_none()
    }
}
