// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity logging.
//!
//! A log entry is an upsert keyed by (date, kind): logging 8 km of running
//! for a day that already has 5 km replaces the value rather than adding.
//! Score thresholds crossed by the new value grant achievements.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::{Db, KeyedLocks};
use crate::error::AppError;
use crate::models::stats::{self, ActivityTotals};
use crate::models::{ActivityKind, ActivityLog};
use crate::services::modify_user;

/// Result of logging one entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogOutcome {
    pub entry: ActivityLog,
    /// Value that was replaced, if the (date, kind) slot was already filled
    pub previous_value: Option<f64>,
    pub totals: ActivityTotals,
    pub new_achievements: Vec<String>,
}

#[derive(Clone)]
pub struct ActivityService {
    db: Db,
    locks: KeyedLocks,
}

impl ActivityService {
    pub fn new(db: Db, locks: KeyedLocks) -> Self {
        Self { db, locks }
    }

    pub async fn log(
        &self,
        user_id: &str,
        date: NaiveDate,
        kind: ActivityKind,
        value: f64,
    ) -> Result<LogOutcome, AppError> {
        validate(kind, value)?;
        let entry = ActivityLog::new(date, kind, value);

        let mut previous_value = None;
        let mut granted = Vec::new();
        let user = modify_user(&self.db, &self.locks, user_id, |user| {
            previous_value = user.upsert_activity(entry.clone());
            let score = stats::activity_score(&user.tracked_activities);
            granted = stats::new_achievements(score, &user.achievements);
            user.achievements.extend(granted.iter().cloned());
            Ok(())
        })
        .await?;

        let totals = ActivityTotals::from_logs(&user.tracked_activities);
        tracing::info!(
            user_id,
            kind = ?kind,
            %date,
            value,
            replaced = previous_value.is_some(),
            score = totals.calculated_score,
            "Logged activity"
        );
        for achievement in &granted {
            tracing::info!(user_id, achievement = %achievement, "Achievement granted");
        }

        Ok(LogOutcome {
            entry,
            previous_value,
            totals,
            new_achievements: granted,
        })
    }
}

fn validate(kind: ActivityKind, value: f64) -> Result<(), AppError> {
    if kind == ActivityKind::Other {
        return Err(AppError::BadRequest(
            "activity_type must be one of running, steps, gym_time".to_string(),
        ));
    }
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::BadRequest(
            "value must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    async fn setup() -> (ActivityService, Db, String) {
        let db = Db::new_in_memory();
        let user = User::new("Ana", "ana@example.com", "hash".to_string());
        db.upsert_user(&user).await.unwrap();
        (ActivityService::new(db.clone(), KeyedLocks::new()), db, user.user_id)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_relogging_replaces_value() {
        let (service, db, id) = setup().await;

        let first = service.log(&id, day(1), ActivityKind::Running, 5.0).await.unwrap();
        assert_eq!(first.previous_value, None);

        let second = service.log(&id, day(1), ActivityKind::Running, 8.0).await.unwrap();
        assert_eq!(second.previous_value, Some(5.0));
        assert_eq!(second.totals.running_total_km, 8.0);

        let user = db.get_user(&id).await.unwrap().unwrap();
        assert_eq!(user.tracked_activities.len(), 1);
        assert_eq!(user.tracked_activities[0].value, 8.0);
    }

    #[tokio::test]
    async fn test_different_days_accumulate() {
        let (service, _, id) = setup().await;
        service.log(&id, day(1), ActivityKind::Running, 5.0).await.unwrap();
        let outcome = service.log(&id, day(2), ActivityKind::Running, 3.0).await.unwrap();
        assert_eq!(outcome.totals.running_total_km, 8.0);
        assert_eq!(outcome.totals.calculated_score, 80.0);
    }

    #[tokio::test]
    async fn test_invalid_values_rejected() {
        let (service, _, id) = setup().await;
        for value in [-1.0, f64::NAN, f64::INFINITY] {
            let err = service.log(&id, day(1), ActivityKind::Steps, value).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
        let err = service.log(&id, day(1), ActivityKind::Other, 1.0).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_achievement_granted_once() {
        let (service, db, id) = setup().await;

        let outcome = service.log(&id, day(1), ActivityKind::Running, 12.0).await.unwrap();
        assert_eq!(outcome.new_achievements, vec!["Reached 100 Points!"]);

        let again = service.log(&id, day(2), ActivityKind::Running, 1.0).await.unwrap();
        assert!(again.new_achievements.is_empty());

        let user = db.get_user(&id).await.unwrap().unwrap();
        assert_eq!(user.achievements, vec!["Reached 100 Points!"]);
    }

    #[tokio::test]
    async fn test_unknown_user_not_found() {
        let (service, _, _) = setup().await;
        let err = service.log("ghost", day(1), ActivityKind::Steps, 10.0).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
