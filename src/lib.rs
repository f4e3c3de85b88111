//! BarberBot booking server
//!
//! The booking core of a single-chair barbershop: service catalog, operating
//! calendar, appointment ledger, slot generation and the booking lifecycle,
//! exposed over a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
