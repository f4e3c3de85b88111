//! Step-by-step booking: pick services, then a date, then a start time

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::Appointment,
    services::{calendar::local_date, sessions::BookingDraft},
    AppState,
};

use super::{slots::SlotsResponse, ClientId};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SelectServicesRequest {
    #[validate(length(min = 1, message = "at least one service is required"))]
    pub service_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectDateRequest {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmDraftRequest {
    /// One of the start times offered for the draft's date
    pub start_time: DateTime<Utc>,
}

/// Current draft of the calling client
#[utoipa::path(
    get,
    path = "/draft",
    tag = "drafts",
    params(("X-Client-Id" = Uuid, Header, description = "Acting client")),
    responses(
        (status = 200, description = "Draft in progress", body = BookingDraft),
        (status = 404, description = "No booking in progress")
    )
)]
pub async fn get_draft(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
) -> AppResult<Json<BookingDraft>> {
    let draft = state
        .services
        .sessions
        .draft(client_id)?
        .ok_or_else(|| AppError::NotFound(format!("No booking in progress for {}", client_id)))?;
    Ok(Json(draft))
}

/// Abandon the draft
#[utoipa::path(
    delete,
    path = "/draft",
    tag = "drafts",
    params(("X-Client-Id" = Uuid, Header, description = "Acting client")),
    responses((status = 204, description = "Draft discarded"))
)]
pub async fn clear_draft(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
) -> AppResult<StatusCode> {
    state.services.sessions.clear(client_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Start a draft with a set of services
#[utoipa::path(
    put,
    path = "/draft/services",
    tag = "drafts",
    params(("X-Client-Id" = Uuid, Header, description = "Acting client")),
    request_body = SelectServicesRequest,
    responses(
        (status = 200, description = "Draft started", body = BookingDraft),
        (status = 422, description = "Unknown or inactive service")
    )
)]
pub async fn select_services(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    Json(request): Json<SelectServicesRequest>,
) -> AppResult<Json<BookingDraft>> {
    request.validate()?;
    // Reject unbookable services now rather than at confirmation
    state.services.catalog.resolve_bookable(&request.service_ids).await?;

    let draft = state
        .services
        .sessions
        .select_services(client_id, &request.service_ids)?;
    Ok(Json(draft))
}

/// Pick the date and get the free start times for the draft's services
#[utoipa::path(
    put,
    path = "/draft/date",
    tag = "drafts",
    params(("X-Client-Id" = Uuid, Header, description = "Acting client")),
    request_body = SelectDateRequest,
    responses(
        (status = 200, description = "Bookable start times on that date", body = SlotsResponse),
        (status = 404, description = "No booking in progress")
    )
)]
pub async fn select_date(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    Json(request): Json<SelectDateRequest>,
) -> AppResult<Json<SlotsResponse>> {
    let draft = state.services.sessions.select_date(client_id, request.date)?;
    let slots = state
        .services
        .slots
        .available_slots(&draft.service_ids, request.date)
        .await?;

    Ok(Json(SlotsResponse {
        date: request.date,
        timezone: state.services.calendar.timezone().name().to_string(),
        slots,
    }))
}

/// Book the draft at one of its offered start times
#[utoipa::path(
    post,
    path = "/draft/confirm",
    tag = "drafts",
    params(("X-Client-Id" = Uuid, Header, description = "Acting client")),
    request_body = ConfirmDraftRequest,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Draft incomplete or start time on another date"),
        (status = 404, description = "No booking in progress"),
        (status = 409, description = "Slot no longer available")
    )
)]
pub async fn confirm_draft(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    Json(request): Json<ConfirmDraftRequest>,
) -> AppResult<(StatusCode, Json<Appointment>)> {
    let services = &state.services;
    let (service_ids, date) = services.sessions.resolve(client_id)?;

    if local_date(&services.calendar.timezone(), request.start_time) != date {
        return Err(AppError::Validation(format!(
            "start time {} is not on {}",
            request.start_time, date
        )));
    }

    let appointment = services
        .booking
        .create(client_id, &service_ids, request.start_time)
        .await?;
    services.sessions.clear(client_id)?;

    Ok((StatusCode::CREATED, Json(appointment)))
}
