// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for parsing client-supplied dates and times.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppError;

/// Parse an RFC3339 timestamp (any offset) into UTC.
pub fn parse_utc_rfc3339(value: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::BadRequest(format!("{} must be an RFC3339 timestamp", field)))
}

/// Parse a `YYYY-MM-DD` date, defaulting to today (UTC) when absent.
pub fn parse_date_or_today(value: Option<&str>) -> Result<NaiveDate, AppError> {
    match value {
        None => Ok(Utc::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest("date must be formatted as YYYY-MM-DD".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_offset_normalized_to_utc() {
        let parsed = parse_utc_rfc3339("2025-06-01T10:00:00+02:00", "date_and_time").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_bad_timestamp_is_bad_request() {
        let err = parse_utc_rfc3339("next tuesday", "date_and_time").unwrap_err();
        assert!(err.to_string().contains("date_and_time"));
    }

    #[test]
    fn test_date_defaults_to_today() {
        assert_eq!(parse_date_or_today(None).unwrap(), Utc::now().date_naive());
        assert_eq!(
            parse_date_or_today(Some("2025-02-28")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert!(parse_date_or_today(Some("28/02/2025")).is_err());
    }
}
