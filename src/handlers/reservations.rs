// ============================================================================
// Reservations Handlers
// ============================================================================
//
// All routes sit behind the request guard; handlers retrieve the verified
// identity through the CurrentUser extractor and never re-authenticate.
// The GraphQL resolvers reuse `create_reservation_for`, so both entry
// points share one code path after the guard.
//
// ============================================================================

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::context::ReservationsContext;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::identity::Identity;
use crate::payments::PaymentProcessor;
use crate::stores::{NewReservation, Reservation, ReservationStore};
use crate::wire::EmailNotification;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub place_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub amount_cents: i64,
}

/// Shared by the HTTP handler and the GraphQL mutation: charge, store,
/// then queue the confirmation email (best effort).
pub async fn create_reservation_for(
    ctx: &ReservationsContext,
    identity: &Identity,
    request: CreateReservationRequest,
) -> Result<Reservation, AppError> {
    if request.place_id.trim().is_empty() {
        return Err(AppError::Validation("placeId must not be empty".to_string()));
    }
    if request.end_date <= request.start_date {
        return Err(AppError::Validation(
            "endDate must be after startDate".to_string(),
        ));
    }

    let receipt = ctx
        .payments
        .create_charge(identity, request.amount_cents, "usd")
        .await?;

    let reservation = ctx
        .reservations
        .create(NewReservation {
            user_id: identity.id,
            place_id: request.place_id,
            start_date: request.start_date,
            end_date: request.end_date,
            invoice_id: Some(receipt.invoice_id),
        })
        .await?;

    tracing::info!(
        reservation_id = %reservation.id,
        user_id = %identity.id,
        place_id = %reservation.place_id,
        "Reservation created"
    );

    if let Some(queue) = &ctx.notifications {
        let notification = EmailNotification {
            to: identity.email.clone(),
            subject: "Reservation confirmed".to_string(),
            body: format!(
                "Your reservation for {} from {} to {} is confirmed.",
                reservation.place_id, reservation.start_date, reservation.end_date
            ),
        };
        if let Err(e) = queue.publish(&notification).await {
            tracing::warn!(error = %e, "Failed to queue confirmation email");
        }
    }

    Ok(reservation)
}

/// POST /reservations
pub async fn create(
    State(ctx): State<Arc<ReservationsContext>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateReservationRequest>,
) -> AppResult<impl IntoResponse> {
    let reservation = create_reservation_for(&ctx, &user, request).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// GET /reservations
pub async fn list_own(
    State(ctx): State<Arc<ReservationsContext>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<Reservation>>> {
    let reservations = ctx.reservations.list_for_user(&user.id).await?;
    Ok(Json(reservations))
}

/// GET /reservations/{id}
pub async fn get_one(
    State(ctx): State<Arc<ReservationsContext>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Reservation>> {
    let reservation = ctx
        .reservations
        .find(&id)
        .await?
        .ok_or(AppError::NotFound("reservation"))?;

    // Owners see their own bookings; staff see everything. Strangers get
    // the same not-found as a nonexistent id.
    let may_view =
        reservation.user_id == user.id || user.has_role("admin") || user.has_role("staff");
    if !may_view {
        return Err(AppError::NotFound("reservation"));
    }

    Ok(Json(reservation))
}

/// DELETE /reservations/{id}
pub async fn delete_one(
    State(ctx): State<Arc<ReservationsContext>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let deleted = ctx.reservations.delete(&id, &user.id).await?;
    if !deleted {
        return Err(AppError::NotFound("reservation"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/reservations (role-gated at the router)
pub async fn list_all(
    State(ctx): State<Arc<ReservationsContext>>,
) -> AppResult<Json<Vec<Reservation>>> {
    let reservations = ctx.reservations.list_all().await?;
    Ok(Json(reservations))
}
