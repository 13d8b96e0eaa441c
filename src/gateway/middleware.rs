use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth_client::AuthClient;
use crate::config::Config;
use crate::error::AppError;
use crate::guard::{self, TRUSTED_IDENTITY_HEADER};

use super::service_client::ServiceClient;

pub struct GatewayState {
    pub config: Arc<Config>,
    pub auth_client: Arc<AuthClient>,
    pub service_client: ServiceClient,
}

/// Verification middleware.
///
/// Any client-supplied copy of the trusted header is stripped before
/// anything else happens; the gateway is the only writer of that header.
/// Public endpoints pass through untouched; everything else is verified
/// and forwarded with the identity attached.
pub async fn identity_propagation(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Response {
    // Always, including on public routes: never let a spoofed identity
    // header cross the boundary.
    request.headers_mut().remove(TRUSTED_IDENTITY_HEADER);

    if is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let identity = match guard::authorize(request.headers(), &[], &state.auth_client).await {
        Ok(identity) => identity,
        Err(_denial) => return AppError::Unauthorized.into_response(),
    };

    let serialized = match serde_json::to_string(&identity)
        .map_err(anyhow::Error::from)
        .and_then(|json| HeaderValue::from_str(&json).map_err(anyhow::Error::from))
    {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode identity header");
            return AppError::Internal(e).into_response();
        }
    };
    request
        .headers_mut()
        .insert(TRUSTED_IDENTITY_HEADER, serialized);

    tracing::debug!(user_id = %identity.id, "Identity forwarded to downstream service");
    next.run(request).await
}

/// Routes that must work without a credential
fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health" | "/auth/login" | "/auth/register")
}
