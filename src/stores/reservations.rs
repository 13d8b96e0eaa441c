use async_trait::async_trait;
use uuid::Uuid;

use crate::db::DbPool;

use super::{NewReservation, Reservation, ReservationStore, StoreError};

/// Postgres-backed reservation store
#[derive(Clone)]
pub struct PgReservationStore {
    pool: DbPool,
}

impl PgReservationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    async fn create(&self, input: NewReservation) -> Result<Reservation, StoreError> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (user_id, place_id, start_date, end_date, invoice_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, place_id, start_date, end_date, invoice_id, created_at
            "#,
        )
        .bind(input.user_id)
        .bind(&input.place_id)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.invoice_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(reservation)
    }

    async fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<Reservation>, StoreError> {
        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, user_id, place_id, start_date, end_date, invoice_id, created_at
            FROM reservations
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    async fn list_all(&self) -> Result<Vec<Reservation>, StoreError> {
        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, user_id, place_id, start_date, end_date, invoice_id, created_at
            FROM reservations
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    async fn find(&self, id: &Uuid) -> Result<Option<Reservation>, StoreError> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, user_id, place_id, start_date, end_date, invoice_id, created_at
            FROM reservations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reservation)
    }

    async fn delete(&self, id: &Uuid, user_id: &Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM reservations
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
