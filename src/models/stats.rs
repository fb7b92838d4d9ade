//! Activity statistics and score aggregation.
//!
//! Everything here is a pure function of a user's activity log, so totals and
//! scores are recomputed on read rather than stored.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{ActivityKind, ActivityLog};

/// Points per kilometre run.
pub const POINTS_PER_KM_RUNNING: f64 = 10.0;
/// Points per 100 steps.
pub const POINTS_PER_100_STEPS: f64 = 1.0;
/// Points per minute in the gym.
pub const POINTS_PER_GYM_MINUTE: f64 = 0.2;

/// Achievements granted when the score first reaches a threshold.
pub const SCORE_ACHIEVEMENTS: &[(f64, &str)] =
    &[(100.0, "Reached 100 Points!"), (500.0, "Reached 500 Points!")];

/// Aggregate a user's activity history into a single score.
///
/// Entries whose unit does not match the kind's canonical unit score zero.
/// The result is rounded to two decimal places.
pub fn activity_score(activities: &[ActivityLog]) -> f64 {
    let score: f64 = activities.iter().map(entry_points).sum();
    round2(score)
}

fn entry_points(entry: &ActivityLog) -> f64 {
    if entry.unit != entry.activity_type.unit() {
        return 0.0;
    }
    match entry.activity_type {
        ActivityKind::Running => entry.value * POINTS_PER_KM_RUNNING,
        ActivityKind::Steps => entry.value / 100.0 * POINTS_PER_100_STEPS,
        ActivityKind::GymTime => entry.value * POINTS_PER_GYM_MINUTE,
        ActivityKind::Other => 0.0,
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Lifetime totals for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityTotals {
    pub running_total_km: f64,
    pub steps_total: u64,
    pub gym_time_total_minutes: u64,
    pub calculated_score: f64,
}

impl ActivityTotals {
    pub fn from_logs(activities: &[ActivityLog]) -> Self {
        let mut totals = Self::default();
        let mut steps = 0.0;
        let mut gym_minutes = 0.0;

        for entry in activities {
            if entry.unit != entry.activity_type.unit() {
                continue;
            }
            match entry.activity_type {
                ActivityKind::Running => totals.running_total_km += entry.value,
                ActivityKind::Steps => steps += entry.value,
                ActivityKind::GymTime => gym_minutes += entry.value,
                ActivityKind::Other => {}
            }
        }

        totals.running_total_km = round2(totals.running_total_km);
        totals.steps_total = steps as u64;
        totals.gym_time_total_minutes = gym_minutes as u64;
        totals.calculated_score = activity_score(activities);
        totals
    }
}

/// Achievements earned at `score` that are not yet in `held`.
pub fn new_achievements(score: f64, held: &[String]) -> Vec<String> {
    SCORE_ACHIEVEMENTS
        .iter()
        .filter(|(threshold, _)| score >= *threshold)
        .map(|(_, name)| name.to_string())
        .filter(|name| !held.contains(name))
        .collect()
}
