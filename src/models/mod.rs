// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod gym;
pub mod stats;
pub mod team;
pub mod user;

pub use gym::{Coordinates, Gym, Subscription};
pub use stats::{activity_score, ActivityTotals};
pub use team::{GroupActivityTeam, NewTeam, TeamChanges, TeamStatus};
pub use user::{normalize_email, ActivityKind, ActivityLog, User};
