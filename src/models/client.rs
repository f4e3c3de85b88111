//! Client profile (read-only view used for calendar entries)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClientProfile {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub telegram: Option<String>,
    pub email: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl ClientProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone: None,
            telegram: None,
            email: None,
            registered_at: Utc::now(),
        }
    }
}
