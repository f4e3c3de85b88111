//! Operating window (working hours) model

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Open/close window for one weekday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OperatingWindow {
    pub id: Uuid,
    /// Day of week (0=Sunday, 6=Saturday)
    pub day_of_week: i16,
    /// Opening time
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    /// Closing time
    #[schema(value_type = String, example = "18:00:00")]
    pub end_time: NaiveTime,
    pub is_active: bool,
}

impl OperatingWindow {
    /// Build an active window, rejecting an empty or inverted range
    pub fn new(day_of_week: i16, start_time: NaiveTime, end_time: NaiveTime) -> AppResult<Self> {
        let window = Self {
            id: Uuid::new_v4(),
            day_of_week,
            start_time,
            end_time,
            is_active: true,
        };
        window.validate_range()?;
        Ok(window)
    }

    pub fn validate_range(&self) -> AppResult<()> {
        if !(0..=6).contains(&self.day_of_week) {
            return Err(AppError::Validation(format!(
                "day_of_week must be within 0..=6, got {}",
                self.day_of_week
            )));
        }
        if self.start_time >= self.end_time {
            return Err(AppError::Validation(format!(
                "window start {} must be before end {}",
                self.start_time, self.end_time
            )));
        }
        Ok(())
    }
}

/// Weekday index of a calendar date (0=Sunday, 6=Saturday)
pub fn day_of_week(date: NaiveDate) -> i16 {
    date.weekday().num_days_from_sunday() as i16
}

/// Upsert working hours request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertOperatingWindow {
    /// Day of week (0=Sunday, 6=Saturday)
    #[validate(range(min = 0, max = 6))]
    pub day_of_week: i16,
    /// Opening time (HH:MM)
    pub start_time: String,
    /// Closing time (HH:MM)
    pub end_time: String,
    pub is_active: Option<bool>,
}

impl UpsertOperatingWindow {
    pub fn parse_times(&self) -> AppResult<(NaiveTime, NaiveTime)> {
        let start = NaiveTime::parse_from_str(&self.start_time, "%H:%M")
            .map_err(|_| AppError::Validation("Invalid start_time (use HH:MM)".to_string()))?;
        let end = NaiveTime::parse_from_str(&self.end_time, "%H:%M")
            .map_err(|_| AppError::Validation("Invalid end_time (use HH:MM)".to_string()))?;
        Ok((start, end))
    }
}
