//! In-process store implementing every repository trait
//!
//! Mirrors the PostgreSQL constraints (one active window per weekday, no
//! overlapping scheduled appointments, revision-checked updates) so the booking
//! core behaves the same against either backend. Used by tests and by `RUN_MODE=memory`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use super::{stale_write_error, CalendarStore, CatalogStore, ClientStore, LedgerStore};
use crate::{
    error::{AppError, AppResult},
    models::{Appointment, AppointmentStatus, ClientProfile, OperatingWindow, Revision, Service},
};

#[derive(Default)]
struct Tables {
    services: HashMap<Uuid, Service>,
    windows: HashMap<Uuid, OperatingWindow>,
    appointments: HashMap<Uuid, Appointment>,
    clients: HashMap<Uuid, ClientProfile>,
}

/// Cheaply cloneable handle; clones share the same tables
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    /// Seed a service
    pub fn insert_service(&self, service: Service) -> AppResult<()> {
        self.tables()?.services.insert(service.id, service);
        Ok(())
    }

    /// Seed a client profile
    pub fn insert_client(&self, client: ClientProfile) -> AppResult<()> {
        self.tables()?.clients.insert(client.id, client);
        Ok(())
    }

    /// Seed a window, bypassing the one-active-per-day check
    pub fn insert_window_unchecked(&self, window: OperatingWindow) -> AppResult<()> {
        self.tables()?.windows.insert(window.id, window);
        Ok(())
    }
}

fn overlaps_scheduled(existing: &HashMap<Uuid, Appointment>, candidate: &Appointment) -> bool {
    candidate.status == AppointmentStatus::Scheduled
        && existing.values().any(|other| {
            other.id != candidate.id
                && other.status == AppointmentStatus::Scheduled
                && candidate.start_time < other.end_time
                && candidate.end_time > other.start_time
        })
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_active(&self) -> AppResult<Vec<Service>> {
        let mut services: Vec<Service> = self
            .tables()?
            .services
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(services)
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Service>> {
        let tables = self.tables()?;
        Ok(ids
            .iter()
            .filter_map(|id| tables.services.get(id).cloned())
            .collect())
    }

    async fn save(&self, service: &Service) -> AppResult<()> {
        self.tables()?.services.insert(service.id, service.clone());
        Ok(())
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn active_windows_for_day(&self, day_of_week: i16) -> AppResult<Vec<OperatingWindow>> {
        let mut windows: Vec<OperatingWindow> = self
            .tables()?
            .windows
            .values()
            .filter(|w| w.is_active && w.day_of_week == day_of_week)
            .cloned()
            .collect();
        windows.sort_by_key(|w| w.start_time);
        Ok(windows)
    }

    async fn list_windows(&self) -> AppResult<Vec<OperatingWindow>> {
        let mut windows: Vec<OperatingWindow> =
            self.tables()?.windows.values().cloned().collect();
        windows.sort_by_key(|w| (w.day_of_week, w.start_time));
        Ok(windows)
    }

    async fn replace_window(&self, window: &OperatingWindow) -> AppResult<()> {
        window.validate_range()?;
        let mut tables = self.tables()?;
        for other in tables.windows.values_mut() {
            if other.id != window.id && other.day_of_week == window.day_of_week {
                other.is_active = false;
            }
        }
        tables.windows.insert(window.id, window.clone());
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn appointments_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Appointment>> {
        let mut rows: Vec<Appointment> = self
            .tables()?
            .appointments
            .values()
            .filter(|a| a.start_time >= from && a.start_time < to)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.start_time);
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Appointment>> {
        Ok(self.tables()?.appointments.get(&id).cloned())
    }

    async fn for_client(&self, client_id: Uuid, scheduled_only: bool) -> AppResult<Vec<Appointment>> {
        let mut rows: Vec<Appointment> = self
            .tables()?
            .appointments
            .values()
            .filter(|a| a.client_id == client_id && (!scheduled_only || a.is_scheduled()))
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.start_time);
        Ok(rows)
    }

    async fn save(&self, appointment: &Appointment) -> AppResult<()> {
        let mut tables = self.tables()?;
        if overlaps_scheduled(&tables.appointments, appointment) {
            return Err(AppError::SlotConflict("time range is already booked".to_string()));
        }
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn update(&self, appointment: &Appointment, expected: Revision) -> AppResult<()> {
        let mut tables = self.tables()?;
        let current = tables.appointments.get(&appointment.id);
        if current.map(Appointment::revision) != Some(expected) {
            return Err(stale_write_error(appointment.id, current));
        }
        if overlaps_scheduled(&tables.appointments, appointment) {
            return Err(AppError::SlotConflict("time range is already booked".to_string()));
        }
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(())
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn get_profile(&self, id: Uuid) -> AppResult<Option<ClientProfile>> {
        Ok(self.tables()?.clients.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime, TimeZone};
    use rust_decimal::Decimal;

    fn appointment(start_hour: u32, minutes: i64) -> Appointment {
        let start = Utc.with_ymd_and_hms(2030, 3, 4, start_hour, 0, 0).unwrap();
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            service_ids: vec![Uuid::new_v4()],
            start_time: start,
            end_time: start + Duration::minutes(minutes),
            status: AppointmentStatus::Scheduled,
            total_price: Decimal::new(1500, 0),
            created_at: now,
            updated_at: now,
            cancelled_at: None,
            calendar_event_id: None,
        }
    }

    #[tokio::test]
    async fn test_overlapping_save_rejected() {
        let store = MemoryStore::new();
        LedgerStore::save(&store, &appointment(10, 60)).await.unwrap();

        let err = LedgerStore::save(&store, &appointment(10, 30)).await.unwrap_err();
        assert!(matches!(err, AppError::SlotConflict(_)));

        // Back-to-back does not overlap under half-open ranges
        LedgerStore::save(&store, &appointment(11, 60)).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_does_not_hold_range() {
        let store = MemoryStore::new();
        let mut first = appointment(10, 60);
        first.status = AppointmentStatus::Cancelled;
        LedgerStore::save(&store, &first).await.unwrap();
        LedgerStore::save(&store, &appointment(10, 60)).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let store = MemoryStore::new();
        let unknown = appointment(10, 60);
        let err = store.update(&unknown, unknown.revision()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_from_stale_revision_rejected() {
        let store = MemoryStore::new();
        let booked = appointment(10, 60);
        LedgerStore::save(&store, &booked).await.unwrap();
        let seen = booked.revision();

        let mut cancelled = booked.clone();
        cancelled.status = AppointmentStatus::Cancelled;
        cancelled.cancelled_at = Some(Utc::now());
        cancelled.updated_at = booked.updated_at + Duration::seconds(1);
        store.update(&cancelled, seen).await.unwrap();

        // A writer that read the scheduled record must not undo the cancel
        let mut moved = booked.clone();
        moved.start_time += Duration::hours(2);
        moved.end_time += Duration::hours(2);
        moved.updated_at = booked.updated_at + Duration::seconds(2);
        let err = store.update(&moved, seen).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyCancelled(id) if id == booked.id));

        let stored = store.get(booked.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Cancelled);
        assert_eq!(stored.start_time, booked.start_time);

        // Same status but a newer write in between
        let other = appointment(14, 60);
        LedgerStore::save(&store, &other).await.unwrap();
        let mut touched = other.clone();
        touched.calendar_event_id = Some("evt-1".to_string());
        touched.updated_at = other.updated_at + Duration::seconds(1);
        store.update(&touched, other.revision()).await.unwrap();
        let err = store.update(&other, other.revision()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_active_window_replaces_previous() {
        let store = MemoryStore::new();
        let open = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let close = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        let first = OperatingWindow::new(2, open, close).unwrap();
        store.replace_window(&first).await.unwrap();

        let later = OperatingWindow::new(2, NaiveTime::from_hms_opt(10, 0, 0).unwrap(), close).unwrap();
        store.replace_window(&later).await.unwrap();

        let active = store.active_windows_for_day(2).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, later.id);
        assert_eq!(store.list_windows().await.unwrap().len(), 2);

        // Other weekdays are untouched
        let tuesday = OperatingWindow::new(3, open, close).unwrap();
        store.replace_window(&tuesday).await.unwrap();
        assert_eq!(store.active_windows_for_day(2).await.unwrap().len(), 1);

        let mut closed = OperatingWindow::new(2, open, close).unwrap();
        closed.is_active = false;
        store.replace_window(&closed).await.unwrap();
        assert!(store.active_windows_for_day(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_window_leaves_day_unchanged() {
        let store = MemoryStore::new();
        let open = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let close = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
        let first = OperatingWindow::new(4, open, close).unwrap();
        store.replace_window(&first).await.unwrap();

        let mut broken = OperatingWindow::new(4, open, close).unwrap();
        broken.end_time = open;
        assert!(store.replace_window(&broken).await.is_err());

        let active = store.active_windows_for_day(4).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, first.id);
    }
}
