//! Data models for BarberBot

pub mod appointment;
pub mod client;
pub mod service;
pub mod working_hours;

// Re-export commonly used types
pub use appointment::{Appointment, AppointmentStatus, Revision};
pub use client::ClientProfile;
pub use service::Service;
pub use working_hours::OperatingWindow;
