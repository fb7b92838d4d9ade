// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User profile stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// UUID (also used as document ID)
    pub user_id: String,
    pub name: String,
    /// Normalized email address, unique across users
    pub email: String,
    /// bcrypt hash
    pub hashed_password: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub fitness_goals: Vec<String>,
    /// Base32 TOTP secret for authenticator apps
    #[serde(default)]
    pub two_fa_key: Option<String>,
    #[serde(default)]
    pub is_2fa_enabled: bool,
    /// At most one entry per (date, activity kind)
    #[serde(default)]
    pub tracked_activities: Vec<ActivityLog>,
    /// Favourite gym IDs
    #[serde(default)]
    pub favourites: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default = "default_true")]
    pub notification_setting: bool,
    /// IDs of teams this user is enrolled in
    #[serde(default)]
    pub bookings: Vec<String>,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Build a fresh account record. The ID is generated here.
    pub fn new(name: &str, email: &str, hashed_password: String) -> Self {
        Self {
            user_id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            hashed_password,
            gender: None,
            age: None,
            fitness_goals: Vec::new(),
            two_fa_key: None,
            is_2fa_enabled: false,
            tracked_activities: Vec::new(),
            favourites: Vec::new(),
            achievements: Vec::new(),
            notification_setting: true,
            bookings: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Record a value for (date, kind), replacing any earlier entry for the same pair.
    ///
    /// Returns the previous value if one was replaced.
    pub fn upsert_activity(&mut self, log: ActivityLog) -> Option<f64> {
        if let Some(existing) = self
            .tracked_activities
            .iter_mut()
            .find(|a| a.date == log.date && a.activity_type == log.activity_type)
        {
            let previous = existing.value;
            *existing = log;
            return Some(previous);
        }
        self.tracked_activities.push(log);
        None
    }
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Kind of tracked activity. Each kind has exactly one canonical unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Running,
    Steps,
    GymTime,
    /// Anything stored by an older client; never scored.
    #[serde(other)]
    Other,
}

impl ActivityKind {
    /// Canonical unit for the kind.
    pub fn unit(self) -> &'static str {
        match self {
            ActivityKind::Running => "km",
            ActivityKind::Steps => "steps",
            ActivityKind::GymTime => "minutes",
            ActivityKind::Other => "",
        }
    }
}

/// One day's value for one activity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityLog {
    pub date: NaiveDate,
    pub activity_type: ActivityKind,
    pub value: f64,
    pub unit: String,
}

impl ActivityLog {
    /// Build a log entry in the kind's canonical unit.
    pub fn new(date: NaiveDate, kind: ActivityKind, value: f64) -> Self {
        Self {
            date,
            activity_type: kind,
            value,
            unit: kind.unit().to_string(),
        }
    }
}
