//! External calendar synchronisation for the owner's schedule

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    config::CalendarConfig,
    error::{AppError, AppResult},
    models::{Appointment, ClientProfile, Service},
};

/// Mirrors appointments into an external calendar
///
/// Callers log and swallow failures; the appointment record stays authoritative.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarSink: Send + Sync {
    /// Create an event, returning its external reference
    async fn add(
        &self,
        appointment: &Appointment,
        client: &ClientProfile,
        services: &[Service],
    ) -> AppResult<String>;

    async fn remove(&self, event_id: &str) -> AppResult<()>;

    async fn update(&self, event_id: &str, appointment: &Appointment) -> AppResult<()>;
}

#[derive(Serialize)]
struct EventBody {
    summary: String,
    description: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Serialize)]
struct EventTimes {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct CreatedEvent {
    id: String,
}

/// Event summary and description shown in the owner's calendar
fn describe(appointment: &Appointment, client: &ClientProfile, services: &[Service]) -> EventBody {
    let names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
    let mut description = format!(
        "Services: {}\nPrice: {}\n\nClient:\n",
        names.join(", "),
        appointment.total_price
    );
    if let Some(phone) = &client.phone {
        description.push_str(&format!("Phone: {}\n", phone));
    }
    if let Some(telegram) = &client.telegram {
        description.push_str(&format!("Telegram: {}\n", telegram));
    }

    EventBody {
        summary: format!("Appointment: {}", client.name),
        description,
        start: appointment.start_time,
        end: appointment.end_time,
    }
}

/// JSON-over-HTTP calendar gateway
///
/// `POST {base}/calendars/{id}/events` returns `{"id": ...}`; the same path
/// with `/{event_id}` accepts `PUT` and `DELETE`.
#[derive(Clone)]
pub struct HttpCalendarSink {
    client: Client,
    config: CalendarConfig,
}

impl HttpCalendarSink {
    pub fn new(config: CalendarConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Calendar(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.config.base_url.trim_end_matches('/'),
            self.config.calendar_id
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl CalendarSink for HttpCalendarSink {
    async fn add(
        &self,
        appointment: &Appointment,
        client: &ClientProfile,
        services: &[Service],
    ) -> AppResult<String> {
        let body = describe(appointment, client, services);
        let created: CreatedEvent = self
            .authorized(self.client.post(self.events_url()))
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Calendar(format!("Failed to create event: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::Calendar(format!("Invalid create event response: {}", e)))?;

        tracing::info!("Calendar event {} created for appointment {}", created.id, appointment.id);
        Ok(created.id)
    }

    async fn remove(&self, event_id: &str) -> AppResult<()> {
        self.authorized(
            self.client
                .delete(format!("{}/{}", self.events_url(), event_id)),
        )
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| AppError::Calendar(format!("Failed to delete event {}: {}", event_id, e)))?;

        tracing::info!("Calendar event {} removed", event_id);
        Ok(())
    }

    async fn update(&self, event_id: &str, appointment: &Appointment) -> AppResult<()> {
        let body = EventTimes {
            start: appointment.start_time,
            end: appointment.end_time,
        };
        self.authorized(
            self.client
                .put(format!("{}/{}", self.events_url(), event_id)),
        )
        .json(&body)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| AppError::Calendar(format!("Failed to update event {}: {}", event_id, e)))?;

        tracing::info!("Calendar event {} moved to {}", event_id, appointment.start_time);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_describe_lists_services_and_contacts() {
        let mut client = ClientProfile::new("Ivan");
        client.phone = Some("+7 (912) 345-67-89".to_string());
        let services = vec![
            Service::new("Haircut", 60, Decimal::new(1500, 0)),
            Service::new("Beard trim", 30, Decimal::new(700, 0)),
        ];
        let start = Utc.with_ymd_and_hms(2030, 1, 10, 9, 0, 0).unwrap();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            client_id: client.id,
            service_ids: services.iter().map(|s| s.id).collect(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(90),
            status: AppointmentStatus::Scheduled,
            total_price: Decimal::new(2200, 0),
            created_at: start,
            updated_at: start,
            cancelled_at: None,
            calendar_event_id: None,
        };

        let body = describe(&appointment, &client, &services);
        assert_eq!(body.summary, "Appointment: Ivan");
        assert!(body.description.contains("Haircut, Beard trim"));
        assert!(body.description.contains("Phone: +7 (912) 345-67-89"));
        assert!(!body.description.contains("Telegram"));
        assert_eq!(body.end - body.start, chrono::Duration::minutes(90));
    }

    #[test]
    fn test_events_url_trims_slash() {
        let sink = HttpCalendarSink::new(CalendarConfig {
            base_url: "http://calendar.local/".to_string(),
            ..CalendarConfig::default()
        })
        .unwrap();
        assert_eq!(sink.events_url(), "http://calendar.local/calendars/primary/events");
    }
}
