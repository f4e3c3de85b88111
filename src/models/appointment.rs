//! Appointment model and status lifecycle

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Appointment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Whether an appointment in this status occupies its time range
    pub fn blocks_slots(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(format!("Invalid appointment status: {}", s)),
        }
    }
}

// Stored as lowercase text
impl sqlx::Type<Postgres> for AppointmentStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for AppointmentStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for AppointmentStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// A booked appointment
///
/// `end_time - start_time` always equals the summed duration of the services
/// at booking time; reschedules shift both ends by the same amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub service_ids: Vec<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Reference to the owner's external calendar entry
    pub calendar_event_id: Option<String>,
}

impl Appointment {
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn is_scheduled(&self) -> bool {
        self.status == AppointmentStatus::Scheduled
    }

    /// The state a writer read, to be checked again when it writes back
    pub fn revision(&self) -> Revision {
        Revision {
            status: self.status,
            updated_at: self.updated_at,
        }
    }
}

/// Status and modification time of a record as last read
///
/// Ledger updates only apply while the stored record still carries the
/// revision the caller started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision {
    pub status: AppointmentStatus,
    pub updated_at: DateTime<Utc>,
}

/// Create appointment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAppointment {
    #[validate(length(min = 1, message = "at least one service is required"))]
    pub service_ids: Vec<Uuid>,
    pub start_time: DateTime<Utc>,
}

/// Reschedule appointment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RescheduleAppointment {
    pub start_time: DateTime<Utc>,
}

/// Query parameters for a client's appointments
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AppointmentQuery {
    /// Only return appointments still scheduled
    pub scheduled_only: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<AppointmentStatus>(), Ok(status));
        }
        assert!("pending".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_only_cancelled_frees_slot() {
        assert!(AppointmentStatus::Scheduled.blocks_slots());
        assert!(AppointmentStatus::Completed.blocks_slots());
        assert!(!AppointmentStatus::Cancelled.blocks_slots());
    }
}
