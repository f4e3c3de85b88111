//! Appointment ledger: the authoritative set of bookings

use chrono::NaiveDate;
use chrono_tz::Tz;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Appointment, Revision},
    repository::Repository,
    services::calendar::day_bounds,
};

#[derive(Clone)]
pub struct Ledger {
    repository: Repository,
    tz: Tz,
}

impl Ledger {
    pub fn new(repository: Repository, tz: Tz) -> Self {
        Self { repository, tz }
    }

    /// Appointments of every status starting on the given local date
    pub async fn appointments_on(&self, date: NaiveDate) -> AppResult<Vec<Appointment>> {
        let (from, to) = day_bounds(&self.tz, date)?;
        self.repository.ledger.appointments_between(from, to).await
    }

    pub async fn appointments_for_client(&self, client_id: Uuid) -> AppResult<Vec<Appointment>> {
        self.repository.ledger.for_client(client_id, false).await
    }

    pub async fn scheduled_appointments_for_client(&self, client_id: Uuid) -> AppResult<Vec<Appointment>> {
        self.repository.ledger.for_client(client_id, true).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Appointment> {
        self.repository
            .ledger
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", id)))
    }

    pub async fn save(&self, appointment: &Appointment) -> AppResult<()> {
        self.repository.ledger.save(appointment).await
    }

    /// Write back a record read at revision `expected`
    pub async fn update(&self, appointment: &Appointment, expected: Revision) -> AppResult<()> {
        self.repository.ledger.update(appointment, expected).await
    }
}
