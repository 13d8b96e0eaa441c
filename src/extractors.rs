// ============================================================================
// Axum Extractors
// ============================================================================
//
// CurrentUser: retrieves the identity the guard attached to the request.
// The guard middleware is the only writer of that extension; a handler
// reached without it is a wiring bug and is rejected, never defaulted.
//
// ============================================================================

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::identity::Identity;

/// The verified identity for this request.
///
/// Usage:
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> ... {
///     let user_id = user.id;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                tracing::warn!("Handler asked for an identity on an unguarded request");
                AppError::MissingIdentity
            })
    }
}
