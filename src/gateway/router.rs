use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    response::Response,
};

use crate::error::AppError;

use super::middleware::GatewayState;

/// Routes a request to the service owning its path prefix.
///
/// Routing rules:
/// - /auth/*          -> auth-service
/// - /reservations/*  -> reservations-service
/// - /admin/*         -> reservations-service
/// - /graphql         -> reservations-service
/// - /payments/*      -> payments-service
/// - /notifications/* -> notifications-service
pub async fn route_request(
    State(state): State<Arc<GatewayState>>,
    request: Request<Body>,
) -> Result<Response, AppError> {
    let path = request.uri().path();
    let gateway = &state.config.gateway;

    let (service, base_url) = match path {
        p if p.starts_with("/auth") => ("auth", &gateway.auth_service_url),
        p if p.starts_with("/reservations") || p.starts_with("/admin") || p == "/graphql" => {
            ("reservations", &gateway.reservations_service_url)
        }
        p if p.starts_with("/payments") => ("payments", &gateway.payments_service_url),
        p if p.starts_with("/notifications") => {
            ("notifications", &gateway.notifications_service_url)
        }
        _ => return Err(AppError::NotFound("route")),
    };

    state
        .service_client
        .forward(base_url, request)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, service, "Failed to forward request");
            AppError::Transport(format!("{} unavailable", service))
        })
}
