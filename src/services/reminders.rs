//! Reminder notifications (best effort)

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Appointment,
};

/// Schedules a reminder ahead of an appointment; cancellable by appointment id
#[async_trait]
pub trait ReminderSink: Send + Sync {
    async fn schedule(&self, appointment: &Appointment, lead: Duration) -> AppResult<()>;

    async fn cancel(&self, appointment_id: Uuid) -> AppResult<()>;
}

/// Records pending reminders and logs them for the delivery worker
#[derive(Clone, Default)]
pub struct TracingReminderSink {
    pending: Arc<Mutex<HashMap<Uuid, DateTime<Utc>>>>,
}

impl TracingReminderSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// When the reminder for an appointment is due, if one is pending
    pub fn due_at(&self, appointment_id: Uuid) -> Option<DateTime<Utc>> {
        self.pending
            .lock()
            .ok()
            .and_then(|p| p.get(&appointment_id).copied())
    }

    fn pending(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<Uuid, DateTime<Utc>>>> {
        self.pending
            .lock()
            .map_err(|_| AppError::Internal("reminder registry lock poisoned".to_string()))
    }
}

#[async_trait]
impl ReminderSink for TracingReminderSink {
    async fn schedule(&self, appointment: &Appointment, lead: Duration) -> AppResult<()> {
        let due = appointment.start_time - lead;
        if due <= Utc::now() {
            tracing::debug!("Appointment {} starts within reminder lead, skipping", appointment.id);
            return Ok(());
        }
        self.pending()?.insert(appointment.id, due);
        tracing::info!("Reminder for appointment {} due at {}", appointment.id, due);
        Ok(())
    }

    async fn cancel(&self, appointment_id: Uuid) -> AppResult<()> {
        if self.pending()?.remove(&appointment_id).is_some() {
            tracing::info!("Reminder for appointment {} cancelled", appointment_id);
        }
        Ok(())
    }
}
