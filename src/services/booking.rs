//! Booking lifecycle: create, cancel, reschedule and complete appointments
//!
//! Offering a slot and booking it are separate calls, so two clients can race
//! for the same start time. Every write that places an appointment on the
//! schedule takes the per-date lock, re-checks the range against the ledger
//! under the slot conflict rule, and only then persists. The PostgreSQL
//! exclusion constraint rejects whatever slips past (other server instances),
//! and both paths surface as `SlotConflict`.
//!
//! Status changes write back against the revision they read, so a cancel that
//! lands while a reschedule waits on its lock is never overwritten.

use chrono::{DateTime, Duration, NaiveDate, SubsecRound, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Appointment, AppointmentStatus, Service},
    repository::Repository,
    services::{
        calendar::local_date,
        calendar_sink::CalendarSink,
        catalog::CatalogService,
        ledger::Ledger,
        reminders::ReminderSink,
        slots::{conflicts, Interval},
    },
};

/// Current time at the precision PostgreSQL stores, so revisions compare exactly
fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// One async lock per local calendar date
#[derive(Clone, Default)]
pub struct DateLocks {
    locks: Arc<Mutex<HashMap<NaiveDate, Arc<AsyncMutex<()>>>>>,
}

impl DateLocks {
    pub async fn acquire(&self, date: NaiveDate) -> AppResult<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| AppError::Internal("date lock table poisoned".to_string()))?;
            // Drop locks nobody holds or waits on
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            locks.entry(date).or_default().clone()
        };
        Ok(lock.lock_owned().await)
    }
}

#[derive(Clone)]
pub struct BookingService {
    repository: Repository,
    catalog: CatalogService,
    ledger: Ledger,
    calendar_sink: Option<Arc<dyn CalendarSink>>,
    reminders: Arc<dyn ReminderSink>,
    locks: DateLocks,
    tz: Tz,
    reminder_lead: Duration,
}

impl BookingService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository: Repository,
        catalog: CatalogService,
        ledger: Ledger,
        calendar_sink: Option<Arc<dyn CalendarSink>>,
        reminders: Arc<dyn ReminderSink>,
        tz: Tz,
        reminder_lead_minutes: i64,
    ) -> Self {
        Self {
            repository,
            catalog,
            ledger,
            calendar_sink,
            reminders,
            locks: DateLocks::default(),
            tz,
            reminder_lead: Duration::minutes(reminder_lead_minutes),
        }
    }

    /// Book `service_ids` for `client_id` starting at `start_time`
    ///
    /// `start_time` is expected to come from `available_slots`; if the range
    /// was taken in the meantime the call fails with `SlotConflict`.
    pub async fn create(
        &self,
        client_id: Uuid,
        service_ids: &[Uuid],
        start_time: DateTime<Utc>,
    ) -> AppResult<Appointment> {
        let selection = self.catalog.resolve_bookable(service_ids).await?;
        let end_time = start_time + Duration::minutes(selection.total_minutes);

        let now = stored_now();
        let mut appointment = Appointment {
            id: Uuid::new_v4(),
            client_id,
            service_ids: selection.service_ids(),
            start_time,
            end_time,
            status: AppointmentStatus::Scheduled,
            total_price: selection.total_price,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
            calendar_event_id: None,
        };

        {
            let _guard = self.locks.acquire(local_date(&self.tz, start_time)).await?;
            self.ensure_free(start_time, end_time, None).await?;
            self.ledger.save(&appointment).await?;
        }

        tracing::info!(
            "Appointment {} booked for client {} at {} ({} min)",
            appointment.id,
            client_id,
            start_time,
            selection.total_minutes
        );

        if let Some(event_id) = self.sync_created(&appointment, &selection.services).await {
            let booked = appointment.revision();
            appointment.calendar_event_id = Some(event_id);
            appointment.updated_at = stored_now();
            if let Err(e) = self.ledger.update(&appointment, booked).await {
                tracing::warn!("Failed to store calendar reference on {}: {}", appointment.id, e);
                appointment.calendar_event_id = None;
                appointment.updated_at = booked.updated_at;
            }
        }

        if let Err(e) = self.reminders.schedule(&appointment, self.reminder_lead).await {
            tracing::warn!("Failed to schedule reminder for {}: {}", appointment.id, e);
        }

        Ok(appointment)
    }

    /// Cancel a future scheduled appointment owned by `client_id`
    pub async fn cancel(&self, client_id: Uuid, appointment_id: Uuid) -> AppResult<Appointment> {
        let mut appointment = self.owned_scheduled(client_id, appointment_id).await?;
        let seen = appointment.revision();

        let now = stored_now();
        if appointment.start_time <= now {
            return Err(AppError::PastAppointment(appointment.id));
        }

        appointment.status = AppointmentStatus::Cancelled;
        appointment.cancelled_at = Some(now);
        appointment.updated_at = now;
        self.ledger.update(&appointment, seen).await?;

        tracing::info!("Appointment {} cancelled by client {}", appointment.id, client_id);

        if let (Some(sink), Some(event_id)) = (&self.calendar_sink, &appointment.calendar_event_id) {
            if let Err(e) = sink.remove(event_id).await {
                tracing::warn!("Failed to remove calendar event {}: {}", event_id, e);
            }
        }
        if let Err(e) = self.reminders.cancel(appointment.id).await {
            tracing::warn!("Failed to cancel reminder for {}: {}", appointment.id, e);
        }

        Ok(appointment)
    }

    /// Move a scheduled appointment to `new_start`, keeping its duration
    pub async fn reschedule(
        &self,
        client_id: Uuid,
        appointment_id: Uuid,
        new_start: DateTime<Utc>,
    ) -> AppResult<Appointment> {
        let mut appointment = self.owned_scheduled(client_id, appointment_id).await?;
        let seen = appointment.revision();

        let now = stored_now();
        if new_start <= now {
            return Err(AppError::PastTarget(new_start));
        }
        if appointment.start_time <= now {
            return Err(AppError::PastAppointment(appointment.id));
        }

        let new_end = new_start + appointment.duration();
        {
            let _guard = self.locks.acquire(local_date(&self.tz, new_start)).await?;
            self.ensure_free(new_start, new_end, Some(appointment.id)).await?;

            appointment.start_time = new_start;
            appointment.end_time = new_end;
            appointment.updated_at = now;
            self.ledger.update(&appointment, seen).await?;
        }

        tracing::info!("Appointment {} rescheduled to {}", appointment.id, new_start);

        if let (Some(sink), Some(event_id)) = (&self.calendar_sink, &appointment.calendar_event_id) {
            if let Err(e) = sink.update(event_id, &appointment).await {
                tracing::warn!("Failed to move calendar event {}: {}", event_id, e);
            }
        }
        if let Err(e) = self.reminders.cancel(appointment.id).await {
            tracing::warn!("Failed to cancel reminder for {}: {}", appointment.id, e);
        }
        if let Err(e) = self.reminders.schedule(&appointment, self.reminder_lead).await {
            tracing::warn!("Failed to schedule reminder for {}: {}", appointment.id, e);
        }

        Ok(appointment)
    }

    /// Mark a scheduled appointment as served
    pub async fn complete(&self, appointment_id: Uuid) -> AppResult<Appointment> {
        let mut appointment = self.ledger.get(appointment_id).await?;
        ensure_scheduled(&appointment)?;
        let seen = appointment.revision();

        appointment.status = AppointmentStatus::Completed;
        appointment.updated_at = stored_now();
        self.ledger.update(&appointment, seen).await?;

        tracing::info!("Appointment {} completed", appointment.id);
        Ok(appointment)
    }

    /// A client's appointments, optionally only those still scheduled
    pub async fn list_client_appointments(
        &self,
        client_id: Uuid,
        scheduled_only: bool,
    ) -> AppResult<Vec<Appointment>> {
        if scheduled_only {
            self.ledger.scheduled_appointments_for_client(client_id).await
        } else {
            self.ledger.appointments_for_client(client_id).await
        }
    }

    async fn owned_scheduled(&self, client_id: Uuid, appointment_id: Uuid) -> AppResult<Appointment> {
        let appointment = self.ledger.get(appointment_id).await?;
        if appointment.client_id != client_id {
            return Err(AppError::Forbidden(format!(
                "Appointment {} belongs to another client",
                appointment_id
            )));
        }
        ensure_scheduled(&appointment)?;
        Ok(appointment)
    }

    /// Fail with `SlotConflict` if `[start, end)` collides with a blocking appointment
    async fn ensure_free(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        ignore: Option<Uuid>,
    ) -> AppResult<()> {
        // A booking from the previous evening may still be running at `start`
        let nearby = self
            .repository
            .ledger
            .appointments_between(start - Duration::days(1), end)
            .await?;

        let taken = nearby
            .iter()
            .filter(|a| a.status.blocks_slots() && Some(a.id) != ignore)
            .any(|a| conflicts(start, end, &Interval::from(a)));

        if taken {
            return Err(AppError::SlotConflict(format!(
                "{} - {} is no longer available",
                start, end
            )));
        }
        Ok(())
    }

    async fn sync_created(
        &self,
        appointment: &Appointment,
        services: &[Service],
    ) -> Option<String> {
        let sink = self.calendar_sink.as_ref()?;

        let client = match self.repository.clients.get_profile(appointment.client_id).await {
            Ok(Some(client)) => client,
            Ok(None) => {
                tracing::warn!("No profile for client {}, skipping calendar sync", appointment.client_id);
                return None;
            }
            Err(e) => {
                tracing::warn!("Failed to load client {}: {}", appointment.client_id, e);
                return None;
            }
        };

        match sink.add(appointment, &client, services).await {
            Ok(event_id) => Some(event_id),
            Err(e) => {
                tracing::warn!("Failed to add calendar event for {}: {}", appointment.id, e);
                None
            }
        }
    }
}

fn ensure_scheduled(appointment: &Appointment) -> AppResult<()> {
    match appointment.status {
        AppointmentStatus::Scheduled => Ok(()),
        AppointmentStatus::Cancelled => Err(AppError::AlreadyCancelled(appointment.id)),
        AppointmentStatus::Completed => Err(AppError::InvalidTransition(format!(
            "appointment {} is already completed",
            appointment.id
        ))),
    }
}
