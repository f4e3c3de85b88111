//! Clients repository (read-only)

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::ClientStore;
use crate::{error::AppResult, models::ClientProfile};

#[derive(Clone)]
pub struct ClientsRepository {
    pool: Pool<Postgres>,
}

impl ClientsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientStore for ClientsRepository {
    async fn get_profile(&self, id: Uuid) -> AppResult<Option<ClientProfile>> {
        let row = sqlx::query_as::<_, ClientProfile>(
            "SELECT id, name, phone, telegram, email, registered_at FROM clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
