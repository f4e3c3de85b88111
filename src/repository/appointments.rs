//! Appointments repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{map_write_error, stale_write_error, LedgerStore};
use crate::{
    error::AppResult,
    models::{Appointment, AppointmentStatus, Revision},
};

#[derive(Clone)]
pub struct AppointmentsRepository {
    pool: Pool<Postgres>,
}

impl AppointmentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for AppointmentsRepository {
    async fn appointments_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE start_time >= $1 AND start_time < $2 ORDER BY start_time",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Appointment>> {
        let row = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn for_client(&self, client_id: Uuid, scheduled_only: bool) -> AppResult<Vec<Appointment>> {
        let rows = if scheduled_only {
            sqlx::query_as::<_, Appointment>(
                "SELECT * FROM appointments WHERE client_id = $1 AND status = $2 ORDER BY start_time",
            )
            .bind(client_id)
            .bind(AppointmentStatus::Scheduled)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Appointment>(
                "SELECT * FROM appointments WHERE client_id = $1 ORDER BY start_time",
            )
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows)
    }

    async fn save(&self, appointment: &Appointment) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO appointments (
                id, client_id, service_ids, start_time, end_time, status, total_price,
                created_at, updated_at, cancelled_at, calendar_event_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                service_ids = EXCLUDED.service_ids,
                start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                status = EXCLUDED.status,
                total_price = EXCLUDED.total_price,
                updated_at = EXCLUDED.updated_at,
                cancelled_at = EXCLUDED.cancelled_at,
                calendar_event_id = EXCLUDED.calendar_event_id
            "#,
        )
        .bind(appointment.id)
        .bind(appointment.client_id)
        .bind(&appointment.service_ids)
        .bind(appointment.start_time)
        .bind(appointment.end_time)
        .bind(appointment.status)
        .bind(appointment.total_price)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .bind(appointment.cancelled_at)
        .bind(&appointment.calendar_event_id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn update(&self, appointment: &Appointment, expected: Revision) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE appointments SET
                service_ids = $2,
                start_time = $3,
                end_time = $4,
                status = $5,
                total_price = $6,
                updated_at = $7,
                cancelled_at = $8,
                calendar_event_id = $9
            WHERE id = $1 AND status = $10 AND updated_at = $11
            "#,
        )
        .bind(appointment.id)
        .bind(&appointment.service_ids)
        .bind(appointment.start_time)
        .bind(appointment.end_time)
        .bind(appointment.status)
        .bind(appointment.total_price)
        .bind(appointment.updated_at)
        .bind(appointment.cancelled_at)
        .bind(&appointment.calendar_event_id)
        .bind(expected.status)
        .bind(expected.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            let current = self.get(appointment.id).await?;
            return Err(stale_write_error(appointment.id, current.as_ref()));
        }
        Ok(())
    }
}
