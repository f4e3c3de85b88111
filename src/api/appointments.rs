//! Appointment endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        appointment::{AppointmentQuery, CreateAppointment, RescheduleAppointment},
        Appointment,
    },
    AppState,
};

use super::ClientId;

/// List the calling client's appointments
#[utoipa::path(
    get,
    path = "/appointments",
    tag = "appointments",
    params(
        ("X-Client-Id" = Uuid, Header, description = "Acting client"),
        AppointmentQuery
    ),
    responses(
        (status = 200, description = "Client appointments, by start time", body = Vec<Appointment>)
    )
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    Query(query): Query<AppointmentQuery>,
) -> AppResult<Json<Vec<Appointment>>> {
    let appointments = state
        .services
        .booking
        .list_client_appointments(client_id, query.scheduled_only.unwrap_or(false))
        .await?;
    Ok(Json(appointments))
}

/// Book a start time previously offered by `/slots`
#[utoipa::path(
    post,
    path = "/appointments",
    tag = "appointments",
    params(("X-Client-Id" = Uuid, Header, description = "Acting client")),
    request_body = CreateAppointment,
    responses(
        (status = 201, description = "Appointment booked", body = Appointment),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Slot no longer available"),
        (status = 422, description = "Unknown or inactive service")
    )
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    Json(request): Json<CreateAppointment>,
) -> AppResult<(StatusCode, Json<Appointment>)> {
    request.validate()?;

    let appointment = state
        .services
        .booking
        .create(client_id, &request.service_ids, request.start_time)
        .await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Cancel an upcoming appointment
#[utoipa::path(
    post,
    path = "/appointments/{id}/cancel",
    tag = "appointments",
    params(
        ("X-Client-Id" = Uuid, Header, description = "Acting client"),
        ("id" = Uuid, Path, description = "Appointment ID")
    ),
    responses(
        (status = 200, description = "Appointment cancelled", body = Appointment),
        (status = 403, description = "Appointment belongs to another client"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Already cancelled or completed"),
        (status = 422, description = "Appointment has already started")
    )
)]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Appointment>> {
    let appointment = state.services.booking.cancel(client_id, id).await?;
    Ok(Json(appointment))
}

/// Move an upcoming appointment to a new start time
#[utoipa::path(
    post,
    path = "/appointments/{id}/reschedule",
    tag = "appointments",
    params(
        ("X-Client-Id" = Uuid, Header, description = "Acting client"),
        ("id" = Uuid, Path, description = "Appointment ID")
    ),
    request_body = RescheduleAppointment,
    responses(
        (status = 200, description = "Appointment moved", body = Appointment),
        (status = 403, description = "Appointment belongs to another client"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Target slot taken, or appointment not scheduled"),
        (status = 422, description = "Target or current start time in the past")
    )
)]
pub async fn reschedule_appointment(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    Path(id): Path<Uuid>,
    Json(request): Json<RescheduleAppointment>,
) -> AppResult<Json<Appointment>> {
    let appointment = state
        .services
        .booking
        .reschedule(client_id, id, request.start_time)
        .await?;
    Ok(Json(appointment))
}

/// Mark an appointment as served
#[utoipa::path(
    post,
    path = "/appointments/{id}/complete",
    tag = "appointments",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment completed", body = Appointment),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Appointment not scheduled")
    )
)]
pub async fn complete_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Appointment>> {
    let appointment = state.services.booking.complete(id).await?;
    Ok(Json(appointment))
}
