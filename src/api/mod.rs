//! API handlers for BarberBot REST endpoints

pub mod appointments;
pub mod drafts;
pub mod health;
pub mod openapi;
pub mod services;
pub mod slots;
pub mod working_hours;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{error::AppError, AppState};

/// Header carrying the acting client's id
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Extractor for the acting client
///
/// Identity comes from the front end that registered the client; it is used
/// for ownership checks only.
pub struct ClientId(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(CLIENT_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::BadRequest("Missing X-Client-Id header".to_string()))?;

        let id = Uuid::parse_str(value.trim())
            .map_err(|_| AppError::BadRequest("Invalid X-Client-Id header".to_string()))?;

        Ok(ClientId(id))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Catalog and availability
        .route(
            "/services",
            get(services::list_services).post(services::create_service),
        )
        .route("/dates", get(slots::list_dates))
        .route("/slots", get(slots::list_slots))
        // Appointments
        .route(
            "/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route("/appointments/:id/cancel", post(appointments::cancel_appointment))
        .route("/appointments/:id/reschedule", post(appointments::reschedule_appointment))
        .route("/appointments/:id/complete", post(appointments::complete_appointment))
        // Booking drafts
        .route("/draft", get(drafts::get_draft).delete(drafts::clear_draft))
        .route("/draft/services", put(drafts::select_services))
        .route("/draft/date", put(drafts::select_date))
        .route("/draft/confirm", post(drafts::confirm_draft))
        // Working hours
        .route(
            "/working-hours",
            get(working_hours::list_working_hours).put(working_hours::set_working_hours),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
