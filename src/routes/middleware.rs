// ============================================================================
// Axum Middleware
// ============================================================================
//
// - request_logging: log all incoming requests
// - enforce: the request guard as a router layer, with the route's role
//   requirement bound into the layer state
//
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::context::AppContext;
use crate::error::AppError;
use crate::guard;

/// Role requirement declared by a protected route. Empty means any
/// authenticated identity is sufficient.
pub type RoleRequirement = &'static [&'static str];

pub const AUTHENTICATED: RoleRequirement = &[];

/// Staff surface: either role is sufficient
pub const STAFF_ROLES: RoleRequirement = &["admin", "staff"];

/// Charge creation
pub const BILLING_ROLES: RoleRequirement = &["admin", "billing"];

/// Request logging middleware
pub async fn request_logging(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}

/// The request guard as middleware.
///
/// Attach with the route's requirement bound into the state:
///
/// ```rust,ignore
/// router.layer(middleware::from_fn_with_state(
///     (ctx.clone(), AUTHENTICATED),
///     enforce,
/// ))
/// ```
///
/// On success the verified identity is attached to the request
/// extensions; on any denial the request is rejected before the handler
/// runs and the extensions stay untouched.
pub async fn enforce(
    State((ctx, requirement)): State<(Arc<AppContext>, RoleRequirement)>,
    mut req: Request,
    next: Next,
) -> Response {
    let outcome = if ctx.config.gateway_trust {
        // Behind the gateway the identity arrives pre-verified; the
        // private-network boundary is a deployment invariant.
        guard::authorize_trusted(req.headers(), requirement)
    } else {
        guard::authorize(req.headers(), requirement, &ctx.auth_client).await
    };

    match outcome {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(_denial) => AppError::Unauthorized.into_response(),
    }
}
