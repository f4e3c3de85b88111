//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{appointments, drafts, health, services, slots, working_hours};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BarberBot API",
        version = "0.3.0",
        description = "Appointment booking for a single-chair barbershop"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        // Catalog
        services::list_services,
        services::create_service,
        // Availability
        slots::list_dates,
        slots::list_slots,
        // Appointments
        appointments::list_appointments,
        appointments::create_appointment,
        appointments::cancel_appointment,
        appointments::reschedule_appointment,
        appointments::complete_appointment,
        // Drafts
        drafts::get_draft,
        drafts::clear_draft,
        drafts::select_services,
        drafts::select_date,
        drafts::confirm_draft,
        // Working hours
        working_hours::list_working_hours,
        working_hours::set_working_hours,
    ),
    components(
        schemas(
            crate::models::Service,
            crate::models::service::CreateService,
            crate::models::OperatingWindow,
            crate::models::working_hours::UpsertOperatingWindow,
            crate::models::Appointment,
            crate::models::AppointmentStatus,
            crate::models::appointment::CreateAppointment,
            crate::models::appointment::RescheduleAppointment,
            crate::services::sessions::BookingDraft,
            slots::SlotsResponse,
            slots::DatesResponse,
            drafts::SelectServicesRequest,
            drafts::SelectDateRequest,
            drafts::ConfirmDraftRequest,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "services", description = "Service catalog"),
        (name = "availability", description = "Open dates and free start times"),
        (name = "appointments", description = "Booking lifecycle"),
        (name = "drafts", description = "Step-by-step booking"),
        (name = "working_hours", description = "Operating calendar")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
