use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, InputObject, Object, Schema, SimpleObject};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::context::ReservationsContext;
use crate::error::AppError;
use crate::handlers::reservations::{create_reservation_for, CreateReservationRequest};
use crate::routes::middleware::STAFF_ROLES;
use crate::stores::{Reservation, ReservationStore};

use super::guard::{current_identity, AuthGuard, RoleGuard};

pub type ReservationsSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(ctx: Arc<ReservationsContext>) -> ReservationsSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(ctx)
        .finish()
}

#[derive(SimpleObject)]
#[graphql(name = "Reservation")]
pub struct ReservationObject {
    pub id: Uuid,
    pub user_id: Uuid,
    pub place_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub invoice_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationObject {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            place_id: r.place_id,
            start_date: r.start_date,
            end_date: r.end_date,
            invoice_id: r.invoice_id,
            created_at: r.created_at,
        }
    }
}

#[derive(InputObject)]
pub struct CreateReservationInput {
    pub place_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount_cents: i64,
}

impl From<CreateReservationInput> for CreateReservationRequest {
    fn from(input: CreateReservationInput) -> Self {
        Self {
            place_id: input.place_id,
            start_date: input.start_date,
            end_date: input.end_date,
            amount_cents: input.amount_cents,
        }
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Reservations belonging to the authenticated user
    #[graphql(guard = "AuthGuard")]
    async fn my_reservations(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Vec<ReservationObject>> {
        let identity = current_identity(ctx)?;
        let svc = ctx.data::<Arc<ReservationsContext>>()?;

        let reservations = svc
            .reservations
            .list_for_user(&identity.id)
            .await
            .map_err(app_error)?;
        Ok(reservations.into_iter().map(Into::into).collect())
    }

    /// Every reservation on the platform (staff only)
    #[graphql(guard = "RoleGuard::new(STAFF_ROLES)")]
    async fn all_reservations(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<Vec<ReservationObject>> {
        let svc = ctx.data::<Arc<ReservationsContext>>()?;
        let reservations = svc.reservations.list_all().await.map_err(app_error)?;
        Ok(reservations.into_iter().map(Into::into).collect())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    #[graphql(guard = "AuthGuard")]
    async fn create_reservation(
        &self,
        ctx: &Context<'_>,
        input: CreateReservationInput,
    ) -> async_graphql::Result<ReservationObject> {
        let identity = current_identity(ctx)?;
        let svc = ctx.data::<Arc<ReservationsContext>>()?;

        let reservation = create_reservation_for(svc, &identity, input.into())
            .await
            .map_err(graphql_error)?;
        Ok(reservation.into())
    }

    #[graphql(guard = "AuthGuard")]
    async fn cancel_reservation(&self, ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<bool> {
        let identity = current_identity(ctx)?;
        let svc = ctx.data::<Arc<ReservationsContext>>()?;

        let deleted = svc
            .reservations
            .delete(&id, &identity.id)
            .await
            .map_err(app_error)?;
        Ok(deleted)
    }
}

fn app_error(err: crate::stores::StoreError) -> async_graphql::Error {
    graphql_error(err.into())
}

/// Maps AppError onto a GraphQL error carrying only the client-safe
/// message; internals were already logged where they happened.
fn graphql_error(err: AppError) -> async_graphql::Error {
    async_graphql::Error::new(err.user_message())
}
