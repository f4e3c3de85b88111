//! Service catalog endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{service::CreateService, Service},
    AppState,
};

/// List services currently offered
#[utoipa::path(
    get,
    path = "/services",
    tag = "services",
    responses(
        (status = 200, description = "Active services", body = Vec<Service>)
    )
)]
pub async fn list_services(State(state): State<AppState>) -> AppResult<Json<Vec<Service>>> {
    let services = state.services.catalog.list_active().await?;
    Ok(Json(services))
}

/// Add a service to the catalog (shop owner)
#[utoipa::path(
    post,
    path = "/services",
    tag = "services",
    request_body = CreateService,
    responses(
        (status = 201, description = "Service created", body = Service),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn create_service(
    State(state): State<AppState>,
    Json(request): Json<CreateService>,
) -> AppResult<(StatusCode, Json<Service>)> {
    let service = state.services.catalog.create(&request).await?;
    Ok((StatusCode::CREATED, Json(service)))
}
