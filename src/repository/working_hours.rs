//! Working hours repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{map_write_error, CalendarStore};
use crate::{error::AppResult, models::OperatingWindow};

#[derive(Clone)]
pub struct WorkingHoursRepository {
    pool: Pool<Postgres>,
}

impl WorkingHoursRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CalendarStore for WorkingHoursRepository {
    async fn active_windows_for_day(&self, day_of_week: i16) -> AppResult<Vec<OperatingWindow>> {
        let rows = sqlx::query_as::<_, OperatingWindow>(
            "SELECT * FROM working_hours WHERE day_of_week = $1 AND is_active = TRUE ORDER BY start_time",
        )
        .bind(day_of_week)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_windows(&self) -> AppResult<Vec<OperatingWindow>> {
        let rows = sqlx::query_as::<_, OperatingWindow>(
            "SELECT * FROM working_hours ORDER BY day_of_week, start_time",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn replace_window(&self, window: &OperatingWindow) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE working_hours SET is_active = FALSE WHERE day_of_week = $1 AND is_active = TRUE AND id <> $2",
        )
        .bind(window.day_of_week)
        .bind(window.id)
        .execute(&mut *tx)
        .await?;

        // uq_working_hours_active_day still guards against a concurrent replace
        sqlx::query(
            r#"
            INSERT INTO working_hours (id, day_of_week, start_time, end_time, is_active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                day_of_week = EXCLUDED.day_of_week,
                start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(window.id)
        .bind(window.day_of_week)
        .bind(window.start_time)
        .bind(window.end_time)
        .bind(window.is_active)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(())
    }
}
