//! Shared fixtures: an in-memory shop open every day 09:00-18:00 UTC

#![allow(dead_code)]

use barberbot_server::{
    config::{AppConfig, BookingConfig},
    models::{OperatingWindow, Service},
    repository::{memory::MemoryStore, Repository},
    services::{reminders::TracingReminderSink, Services},
    AppState,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

pub struct Shop {
    pub store: MemoryStore,
    pub services: Services,
    pub reminders: TracingReminderSink,
    pub haircut: Service,
    pub beard: Service,
    pub retired: Service,
}

pub fn booking_config() -> BookingConfig {
    BookingConfig {
        timezone: "UTC".to_string(),
        ..BookingConfig::default()
    }
}

pub fn shop() -> Shop {
    let store = MemoryStore::new();

    let haircut = Service::new("Haircut", 60, Decimal::new(1500, 0));
    let beard = Service::new("Beard trim", 30, Decimal::new(700, 0));
    let retired = Service::new("Hot towel", 15, Decimal::new(300, 0)).inactive();
    for s in [&haircut, &beard, &retired] {
        store.insert_service(s.clone()).unwrap();
    }

    let open = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let close = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
    for day in 0..7 {
        store
            .insert_window_unchecked(OperatingWindow::new(day, open, close).unwrap())
            .unwrap();
    }

    let reminders = TracingReminderSink::new();
    let services = Services::new(
        Repository::in_memory(store.clone()),
        &booking_config(),
        None,
        Arc::new(reminders.clone()),
    )
    .unwrap();

    Shop {
        store,
        services,
        reminders,
        haircut,
        beard,
        retired,
    }
}

pub fn state(shop: &Shop) -> AppState {
    AppState {
        config: Arc::new(AppConfig {
            booking: booking_config(),
            ..AppConfig::default()
        }),
        services: Arc::new(shop.services.clone()),
    }
}

/// A date `days` ahead of today (UTC)
pub fn day(days: i64) -> NaiveDate {
    (Utc::now() + Duration::days(days)).date_naive()
}

pub fn at(date: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
    date.and_hms_opt(h, m, 0).unwrap().and_utc()
}
