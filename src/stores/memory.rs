//! In-memory stores for tests and STORE_BACKEND=memory demo deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewReservation, Reservation, ReservationStore, StoreError, User, UserStore};

#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!(
                "email '{}' is already registered",
                email
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            roles: roles.to_vec(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryReservationStore {
    reservations: Arc<RwLock<HashMap<Uuid, Reservation>>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn create(&self, input: NewReservation) -> Result<Reservation, StoreError> {
        let reservation = Reservation {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            place_id: input.place_id,
            start_date: input.start_date,
            end_date: input.end_date,
            invoice_id: input.invoice_id,
            created_at: Utc::now(),
        };

        let mut reservations = self.reservations.write().await;
        reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        let mut out: Vec<Reservation> = reservations
            .values()
            .filter(|r| r.user_id == *user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn list_all(&self) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        let mut out: Vec<Reservation> = reservations.values().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn find(&self, id: &Uuid) -> Result<Option<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        Ok(reservations.get(id).cloned())
    }

    async fn delete(&self, id: &Uuid, user_id: &Uuid) -> Result<bool, StoreError> {
        let mut reservations = self.reservations.write().await;
        match reservations.get(id) {
            Some(r) if r.user_id == *user_id => {
                reservations.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = InMemoryUserStore::new();
        store.create("a@b.c", "hash", &[]).await.unwrap();
        let err = store.create("a@b.c", "hash2", &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_requires_matching_owner() {
        let store = InMemoryReservationStore::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let reservation = store
            .create(NewReservation {
                user_id: owner,
                place_id: "cabin-12".to_string(),
                start_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 9, 4).unwrap(),
                invoice_id: None,
            })
            .await
            .unwrap();

        assert!(!store.delete(&reservation.id, &stranger).await.unwrap());
        assert!(store.delete(&reservation.id, &owner).await.unwrap());
        assert!(store.find(&reservation.id).await.unwrap().is_none());
    }
}
