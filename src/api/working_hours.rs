//! Working hours endpoints

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{working_hours::UpsertOperatingWindow, OperatingWindow},
    AppState,
};

/// List configured operating windows
#[utoipa::path(
    get,
    path = "/working-hours",
    tag = "working_hours",
    responses(
        (status = 200, description = "All windows, by weekday", body = Vec<OperatingWindow>)
    )
)]
pub async fn list_working_hours(State(state): State<AppState>) -> AppResult<Json<Vec<OperatingWindow>>> {
    let windows = state.services.calendar.list_windows().await?;
    Ok(Json(windows))
}

/// Set the working hours of one weekday
#[utoipa::path(
    put,
    path = "/working-hours",
    tag = "working_hours",
    request_body = UpsertOperatingWindow,
    responses(
        (status = 200, description = "Window saved", body = OperatingWindow),
        (status = 400, description = "Invalid day or times")
    )
)]
pub async fn set_working_hours(
    State(state): State<AppState>,
    Json(request): Json<UpsertOperatingWindow>,
) -> AppResult<Json<OperatingWindow>> {
    request.validate()?;
    let window = state.services.calendar.set_window(&request).await?;
    Ok(Json(window))
}
