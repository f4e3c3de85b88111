//! Business logic services

pub mod booking;
pub mod calendar;
pub mod calendar_sink;
pub mod catalog;
pub mod ledger;
pub mod redis;
pub mod reminders;
pub mod sessions;
pub mod slots;

use std::sync::Arc;

use crate::{
    config::BookingConfig,
    error::{AppError, AppResult},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub calendar: calendar::CalendarService,
    pub ledger: ledger::Ledger,
    pub slots: slots::SlotService,
    pub booking: booking::BookingService,
    pub sessions: sessions::BookingSessions,
    pub horizon_days: u32,
}

impl Services {
    /// Create all services with the given repository and sinks
    pub fn new(
        repository: Repository,
        booking_config: &BookingConfig,
        calendar_sink: Option<Arc<dyn calendar_sink::CalendarSink>>,
        reminders: Arc<dyn reminders::ReminderSink>,
    ) -> AppResult<Self> {
        let tz = booking_config
            .timezone()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let catalog = catalog::CatalogService::new(repository.clone());
        let calendar = calendar::CalendarService::new(repository.clone(), tz);
        let ledger = ledger::Ledger::new(repository.clone(), tz);

        Ok(Self {
            slots: slots::SlotService::new(
                catalog.clone(),
                calendar.clone(),
                ledger.clone(),
                tz,
                booking_config.slot_granularity_minutes,
            ),
            booking: booking::BookingService::new(
                repository,
                catalog.clone(),
                ledger.clone(),
                calendar_sink,
                reminders,
                tz,
                booking_config.reminder_lead_minutes,
            ),
            sessions: sessions::BookingSessions::new(),
            horizon_days: booking_config.horizon_days,
            catalog,
            calendar,
            ledger,
        })
    }
}
