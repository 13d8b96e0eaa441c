// ============================================================================
// Storage Collaborators
// ============================================================================
//
// Narrow interfaces consumed by the core:
// - UserStore: user-record lookup by id/email, owned by the authority
// - ReservationStore: booking CRUD, owned by reservations-service
//
// Postgres implementations back production; in-memory implementations back
// tests and demo (STORE_BACKEND=memory) deployments.
//
// ============================================================================

pub mod memory;
pub mod reservations;
pub mod users;

pub use memory::{InMemoryReservationStore, InMemoryUserStore};
pub use reservations::PgReservationStore;
pub use users::PgUserStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Authority-side user record. The only place a password hash lives.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}

/// A stored booking. `user_id` is the identity that created it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub place_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub invoice_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a reservation; `user_id` comes from the verified
/// identity, never from the request body.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub user_id: Uuid,
    pub place_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub invoice_id: Option<String>,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for crate::error::AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => crate::error::AppError::Conflict(msg),
            StoreError::Database(e) => crate::error::AppError::Database(e),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync + 'static {
    async fn create(&self, input: NewReservation) -> Result<Reservation, StoreError>;

    async fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<Reservation>, StoreError>;

    /// All reservations regardless of owner (admin surface)
    async fn list_all(&self) -> Result<Vec<Reservation>, StoreError>;

    async fn find(&self, id: &Uuid) -> Result<Option<Reservation>, StoreError>;

    /// Returns true when a row was deleted
    async fn delete(&self, id: &Uuid, user_id: &Uuid) -> Result<bool, StoreError>;
}
