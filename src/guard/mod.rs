// ============================================================================
// Request Guard
// ============================================================================
//
// The interception point run before every protected operation:
//
//   extract credential -> verify against the authority -> evaluate roles
//
// The same pipeline backs the plain-HTTP middleware, the GraphQL field
// guards and the gateway. Extraction and evaluation are synchronous and
// in-memory; the remote verification is the single suspension point and
// is bounded by the Authentication Client's timeout.
//
// Every failure collapses to a uniform denial at the response boundary;
// the distinct reasons below exist for logging only.
//
// ============================================================================

pub mod credentials;
pub mod roles;

pub use credentials::extract_credential;

use axum::http::HeaderMap;
use thiserror::Error;

use crate::auth_client::AuthClient;
use crate::error::AppError;
use crate::identity::Identity;

/// Internal header carrying the gateway-verified identity (JSON) to
/// downstream services. Only meaningful inside the private network
/// between the gateway and the services it fronts.
pub const TRUSTED_IDENTITY_HEADER: &str = "x-authenticated-user";

/// Why a request was denied. Never exposed to clients; each variant maps
/// to the same `Unauthorized` response while logging its own event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    #[error("request carries no credential")]
    NoCredential,

    #[error("authority unreachable: {0}")]
    AuthorityUnreachable(String),

    #[error("credential rejected by authority")]
    InvalidCredential,

    #[error("identity lacks a required role")]
    InsufficientRole,

    #[error("execution context lacks the wrapped request")]
    MalformedContext,
}

impl Denial {
    pub fn kind(&self) -> &'static str {
        match self {
            Denial::NoCredential => "no_credential",
            Denial::AuthorityUnreachable(_) => "authority_unreachable",
            Denial::InvalidCredential => "invalid_credential",
            Denial::InsufficientRole => "insufficient_role",
            Denial::MalformedContext => "malformed_context",
        }
    }

    /// One log event per denial kind; this is the only place reasons stay
    /// distinguishable.
    pub fn log(&self) {
        match self {
            Denial::NoCredential => {
                tracing::debug!(denial = self.kind(), "Request carries no credential")
            }
            Denial::AuthorityUnreachable(reason) => tracing::error!(
                denial = self.kind(),
                reason = %reason,
                "Authentication authority unreachable"
            ),
            Denial::InvalidCredential => {
                tracing::warn!(denial = self.kind(), "Credential rejected by authority")
            }
            Denial::InsufficientRole => {
                tracing::warn!(denial = self.kind(), "Insufficient role")
            }
            Denial::MalformedContext => tracing::warn!(
                denial = self.kind(),
                "Execution context lacks the wrapped request"
            ),
        }
    }
}

impl From<Denial> for AppError {
    fn from(_: Denial) -> Self {
        // All denial reasons collapse to one response shape
        AppError::Unauthorized
    }
}

/// Full guard pipeline for a protected operation.
///
/// A request without a credential is denied without touching the
/// authority. Each denial is logged with its distinct kind before being
/// returned.
pub async fn authorize(
    headers: &HeaderMap,
    requirement: &[&str],
    client: &AuthClient,
) -> Result<Identity, Denial> {
    let result: Result<Identity, Denial> = async {
        let credential = extract_credential(headers).ok_or(Denial::NoCredential)?;
        let identity = client.verify(&credential).await?;
        roles::evaluate(&identity.roles, requirement)?;
        Ok(identity)
    }
    .await;

    if let Err(denial) = &result {
        denial.log();
    }
    result
}

/// Verification-only entry point for the GraphQL handler: resolves the
/// identity when a credential is present, reports `None` when the request
/// is anonymous, and logs (but swallows into `None`) verification
/// failures so that public fields still resolve. Field guards then deny
/// protected fields for requests without an identity.
pub async fn resolve_identity(headers: &HeaderMap, client: &AuthClient) -> Option<Identity> {
    let credential = extract_credential(headers)?;

    match client.verify(&credential).await {
        Ok(identity) => Some(identity),
        Err(denial) => {
            denial.log();
            None
        }
    }
}

/// Guard pipeline for services deployed behind the gateway
/// (`GATEWAY_TRUST=true`): the identity arrives pre-verified in
/// `x-authenticated-user` and no remote call is made. Role evaluation
/// still runs here. Valid only when nothing but the gateway can reach
/// this process.
pub fn authorize_trusted(headers: &HeaderMap, requirement: &[&str]) -> Result<Identity, Denial> {
    let result = parse_trusted_identity(headers).and_then(|identity| {
        roles::evaluate(&identity.roles, requirement)?;
        Ok(identity)
    });

    if let Err(denial) = &result {
        denial.log();
    }
    result
}

fn parse_trusted_identity(headers: &HeaderMap) -> Result<Identity, Denial> {
    let raw = headers
        .get(TRUSTED_IDENTITY_HEADER)
        .ok_or(Denial::NoCredential)?;

    let raw = raw.to_str().map_err(|_| Denial::InvalidCredential)?;
    serde_json::from_str(raw).map_err(|_| Denial::InvalidCredential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn identity(roles: &[&str]) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "guest@example.com".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn trusted_header_round_trips_identity() {
        let original = identity(&["admin"]);
        let mut headers = HeaderMap::new();
        headers.insert(
            TRUSTED_IDENTITY_HEADER,
            HeaderValue::from_str(&serde_json::to_string(&original).unwrap()).unwrap(),
        );

        let resolved = authorize_trusted(&headers, &["admin"]).unwrap();
        assert_eq!(resolved, original);
    }

    #[test]
    fn trusted_path_still_evaluates_roles() {
        let mut headers = HeaderMap::new();
        headers.insert(
            TRUSTED_IDENTITY_HEADER,
            HeaderValue::from_str(&serde_json::to_string(&identity(&[])).unwrap()).unwrap(),
        );

        assert_eq!(
            authorize_trusted(&headers, &["admin"]),
            Err(Denial::InsufficientRole)
        );
    }

    #[test]
    fn missing_trusted_header_is_no_credential() {
        assert_eq!(
            authorize_trusted(&HeaderMap::new(), &[]),
            Err(Denial::NoCredential)
        );
    }

    #[test]
    fn garbage_trusted_header_is_invalid() {
        let mut headers = HeaderMap::new();
        headers.insert(
            TRUSTED_IDENTITY_HEADER,
            HeaderValue::from_static("not json"),
        );
        assert_eq!(
            authorize_trusted(&headers, &[]),
            Err(Denial::InvalidCredential)
        );
    }

    #[test]
    fn denial_kinds_are_distinct() {
        let kinds: BTreeSet<&str> = [
            Denial::NoCredential,
            Denial::AuthorityUnreachable("x".into()),
            Denial::InvalidCredential,
            Denial::InsufficientRole,
            Denial::MalformedContext,
        ]
        .iter()
        .map(|d| d.kind())
        .collect();
        assert_eq!(kinds.len(), 5);
    }
}
