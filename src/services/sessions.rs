//! In-progress booking selections, keyed by client
//!
//! The conversational front end collects services first, then a date, then a
//! start time. The draft lives here between steps; the booking core itself
//! only ever sees the fully resolved parameters returned by `resolve`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    services::catalog::dedup_ids,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookingDraft {
    pub service_ids: Vec<Uuid>,
    pub date: Option<NaiveDate>,
}

#[derive(Clone, Default)]
pub struct BookingSessions {
    drafts: Arc<Mutex<HashMap<Uuid, BookingDraft>>>,
}

impl BookingSessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn drafts(&self) -> AppResult<MutexGuard<'_, HashMap<Uuid, BookingDraft>>> {
        self.drafts
            .lock()
            .map_err(|_| AppError::Internal("booking sessions lock poisoned".to_string()))
    }

    /// Start a new draft with the chosen services, discarding any previous one
    pub fn select_services(&self, client_id: Uuid, service_ids: &[Uuid]) -> AppResult<BookingDraft> {
        if service_ids.is_empty() {
            return Err(AppError::Validation("at least one service is required".to_string()));
        }
        let draft = BookingDraft {
            service_ids: dedup_ids(service_ids),
            date: None,
        };
        self.drafts()?.insert(client_id, draft.clone());
        Ok(draft)
    }

    pub fn select_date(&self, client_id: Uuid, date: NaiveDate) -> AppResult<BookingDraft> {
        let mut drafts = self.drafts()?;
        let draft = drafts
            .get_mut(&client_id)
            .ok_or_else(|| AppError::NotFound(format!("No booking in progress for {}", client_id)))?;
        draft.date = Some(date);
        Ok(draft.clone())
    }

    pub fn draft(&self, client_id: Uuid) -> AppResult<Option<BookingDraft>> {
        Ok(self.drafts()?.get(&client_id).cloned())
    }

    pub fn clear(&self, client_id: Uuid) -> AppResult<()> {
        self.drafts()?.remove(&client_id);
        Ok(())
    }

    /// The resolved `(service_ids, date)` of a complete draft
    ///
    /// The draft stays in place until `clear`, so a failed booking can be retried.
    pub fn resolve(&self, client_id: Uuid) -> AppResult<(Vec<Uuid>, NaiveDate)> {
        match self.drafts()?.get(&client_id) {
            None => Err(AppError::NotFound(format!(
                "No booking in progress for {}",
                client_id
            ))),
            Some(BookingDraft { date: None, .. }) => {
                Err(AppError::Validation("no date selected".to_string()))
            }
            Some(BookingDraft {
                service_ids,
                date: Some(date),
            }) => Ok((service_ids.clone(), *date)),
        }
    }
}
