// ============================================================================
// Service Routers
// ============================================================================
//
// One builder per service. Protected subtrees declare their role
// requirement where the guard layer is attached; the requirement is read
// by the guard, never by handlers.
//
// ============================================================================

pub mod health;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::context::{
    AuthorityContext, NotificationsContext, PaymentsContext, ReservationsContext,
};
use crate::graphql;
use crate::handlers;

use health::health_check;
use middleware::{enforce, AUTHENTICATED, BILLING_ROLES, STAFF_ROLES};

/// Authority HTTP surface. Login and register are public by nature;
/// /auth/authenticate is internal and takes the credential itself.
pub fn auth_router(ctx: Arc<AuthorityContext>) -> Router {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/authenticate", post(handlers::auth::authenticate))
        .route("/health", get(health_check))
        .with_state(ctx)
}

/// Reservations surface: guarded REST routes, a staff-only admin route
/// and the GraphQL subgraph sharing the same guard pipeline.
pub fn reservations_router(ctx: Arc<ReservationsContext>) -> Router {
    let app = ctx.app.clone();

    let protected = Router::new()
        .route(
            "/reservations",
            post(handlers::reservations::create).get(handlers::reservations::list_own),
        )
        .route(
            "/reservations/{id}",
            get(handlers::reservations::get_one).delete(handlers::reservations::delete_one),
        )
        .layer(from_fn_with_state((app.clone(), AUTHENTICATED), enforce))
        .with_state(ctx.clone());

    let admin = Router::new()
        .route("/admin/reservations", get(handlers::reservations::list_all))
        .layer(from_fn_with_state((app.clone(), STAFF_ROLES), enforce))
        .with_state(ctx.clone());

    Router::new()
        .merge(protected)
        .merge(admin)
        .merge(graphql::router(ctx))
        .route("/health", get(health_check))
}

pub fn payments_router(ctx: Arc<PaymentsContext>) -> Router {
    let app = ctx.app.clone();

    Router::new()
        .route("/payments/charge", post(handlers::payments::create_charge))
        .layer(from_fn_with_state((app, BILLING_ROLES), enforce))
        .with_state(ctx)
        .route("/health", get(health_check))
}

pub fn notifications_router(ctx: Arc<NotificationsContext>) -> Router {
    let app = ctx.app.clone();

    Router::new()
        .route(
            "/notifications/email",
            post(handlers::notifications::send_email),
        )
        .layer(from_fn_with_state((app, AUTHENTICATED), enforce))
        .with_state(ctx)
        .route("/health", get(health_check))
}
