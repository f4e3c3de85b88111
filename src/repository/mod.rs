//! Repository layer: store interfaces and their implementations
//!
//! The booking core only talks to the traits below. `Repository` bundles one
//! implementation of each, backed by PostgreSQL, by the in-process
//! [`memory::MemoryStore`], or by either wrapped in the Redis read-through
//! cache from [`cached`].

pub mod appointments;
pub mod cached;
pub mod catalog;
pub mod clients;
pub mod memory;
pub mod working_hours;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Appointment, AppointmentStatus, ClientProfile, OperatingWindow, Revision, Service},
    services::redis::RedisCache,
};

/// Bookable services
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All services with `is_active = true`, in display order
    async fn list_active(&self) -> AppResult<Vec<Service>>;

    /// Services matching `ids`, active or not. Unknown ids are simply absent.
    async fn get_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Service>>;

    async fn save(&self, service: &Service) -> AppResult<()>;
}

/// Working hours configuration
#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn active_windows_for_day(&self, day_of_week: i16) -> AppResult<Vec<OperatingWindow>>;

    async fn list_windows(&self) -> AppResult<Vec<OperatingWindow>>;

    /// Upsert a window as its weekday's current one, deactivating every other
    /// window of that weekday in the same atomic write
    async fn replace_window(&self, window: &OperatingWindow) -> AppResult<()>;
}

/// Authoritative appointment records
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Appointments of any status whose start falls within `[from, to)`
    async fn appointments_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Appointment>>;

    async fn get(&self, id: Uuid) -> AppResult<Option<Appointment>>;

    async fn for_client(&self, client_id: Uuid, scheduled_only: bool) -> AppResult<Vec<Appointment>>;

    /// Upsert one appointment record
    async fn save(&self, appointment: &Appointment) -> AppResult<()>;

    /// Replace an existing record if it still carries `expected`
    ///
    /// Fails with [`stale_write_error`] when the record is gone or another
    /// writer changed it since `expected` was read.
    async fn update(&self, appointment: &Appointment, expected: Revision) -> AppResult<()>;
}

/// Client profiles, owned by the registration flow
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> AppResult<Option<ClientProfile>>;
}

/// Main repository struct holding one implementation of each store
#[derive(Clone)]
pub struct Repository {
    pub catalog: Arc<dyn CatalogStore>,
    pub calendar: Arc<dyn CalendarStore>,
    pub ledger: Arc<dyn LedgerStore>,
    pub clients: Arc<dyn ClientStore>,
}

impl Repository {
    /// Create a PostgreSQL-backed repository
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            catalog: Arc::new(catalog::CatalogRepository::new(pool.clone())),
            calendar: Arc::new(working_hours::WorkingHoursRepository::new(pool.clone())),
            ledger: Arc::new(appointments::AppointmentsRepository::new(pool.clone())),
            clients: Arc::new(clients::ClientsRepository::new(pool)),
        }
    }

    /// Create a repository over a shared in-memory store
    pub fn in_memory(store: memory::MemoryStore) -> Self {
        Self {
            catalog: Arc::new(store.clone()),
            calendar: Arc::new(store.clone()),
            ledger: Arc::new(store.clone()),
            clients: Arc::new(store),
        }
    }

    /// Wrap every store in a cache-aside layer
    pub fn with_cache(self, cache: RedisCache) -> Self {
        Self {
            catalog: Arc::new(cached::CachedCatalog::new(self.catalog, cache.clone())),
            calendar: Arc::new(cached::CachedCalendar::new(self.calendar, cache.clone())),
            ledger: Arc::new(cached::CachedLedger::new(self.ledger, cache.clone())),
            clients: Arc::new(cached::CachedClients::new(self.clients, cache)),
        }
    }
}

/// Translate constraint violations on writes into business errors
pub(crate) fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        match db.code().as_deref() {
            // exclusion_violation: appointments_no_overlap
            Some("23P01") => {
                return AppError::SlotConflict("time range is already booked".to_string())
            }
            // unique_violation: uq_working_hours_active_day
            Some("23505") => return AppError::Conflict(db.message().to_string()),
            _ => {}
        }
    }
    AppError::Database(e)
}

/// Error for an update whose expected revision no longer matches `current`
pub(crate) fn stale_write_error(id: Uuid, current: Option<&Appointment>) -> AppError {
    match current.map(|a| a.status) {
        None => AppError::NotFound(format!("Appointment {} not found", id)),
        Some(AppointmentStatus::Cancelled) => AppError::AlreadyCancelled(id),
        Some(AppointmentStatus::Completed) => {
            AppError::InvalidTransition(format!("appointment {} is already completed", id))
        }
        Some(AppointmentStatus::Scheduled) => {
            AppError::Conflict(format!("appointment {} was modified concurrently", id))
        }
    }
}
