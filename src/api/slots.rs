//! Availability endpoints: open dates and free start times

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    AppState,
};

/// Query parameters for slot lookup
#[derive(Debug, Deserialize, IntoParams)]
pub struct SlotsQuery {
    /// Local calendar date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Comma-separated service ids
    pub service_ids: String,
}

#[derive(Serialize, ToSchema)]
pub struct SlotsResponse {
    pub date: NaiveDate,
    /// Operating timezone the date is interpreted in
    pub timezone: String,
    /// Bookable start times, ascending
    pub slots: Vec<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct DatesResponse {
    pub timezone: String,
    /// Opening time of each open day within the booking horizon
    pub dates: Vec<DateTime<Utc>>,
}

fn parse_ids(raw: &str) -> AppResult<Vec<Uuid>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s).map_err(|_| AppError::BadRequest(format!("Invalid service id: {}", s)))
        })
        .collect()
}

/// Open days within the booking horizon
#[utoipa::path(
    get,
    path = "/dates",
    tag = "availability",
    responses(
        (status = 200, description = "Open days", body = DatesResponse)
    )
)]
pub async fn list_dates(State(state): State<AppState>) -> AppResult<Json<DatesResponse>> {
    let calendar = &state.services.calendar;
    let dates = calendar.candidate_dates(state.services.horizon_days).await?;
    Ok(Json(DatesResponse {
        timezone: calendar.timezone().name().to_string(),
        dates,
    }))
}

/// Free start times on a date for a set of services
#[utoipa::path(
    get,
    path = "/slots",
    tag = "availability",
    params(SlotsQuery),
    responses(
        (status = 200, description = "Bookable start times", body = SlotsResponse),
        (status = 400, description = "Malformed service ids or empty selection"),
        (status = 422, description = "Unknown or inactive service")
    )
)]
pub async fn list_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotsQuery>,
) -> AppResult<Json<SlotsResponse>> {
    let service_ids = parse_ids(&query.service_ids)?;
    let slots = state
        .services
        .slots
        .available_slots(&service_ids, query.date)
        .await?;

    Ok(Json(SlotsResponse {
        date: query.date,
        timezone: state.services.calendar.timezone().name().to_string(),
        slots,
    }))
}
