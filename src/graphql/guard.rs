//! Field guards: the request guard's GraphQL face.
//!
//! The remote verification already happened once in the HTTP handler;
//! these guards only check its outcome and evaluate roles, so a query
//! touching many protected fields costs one authority round trip.

use async_graphql::{Context, Guard};

use crate::guard::{roles, Denial};
use crate::identity::Identity;
use crate::routes::middleware::RoleRequirement;

use super::RequestEnvelope;

/// Allows any authenticated identity
pub struct AuthGuard;

impl Guard for AuthGuard {
    async fn check(&self, ctx: &Context<'_>) -> async_graphql::Result<()> {
        identity_from_context(ctx).map(|_| ())
    }
}

/// Allows identities holding ANY of the required roles
pub struct RoleGuard {
    requirement: RoleRequirement,
}

impl RoleGuard {
    pub fn new(requirement: RoleRequirement) -> Self {
        Self { requirement }
    }
}

impl Guard for RoleGuard {
    async fn check(&self, ctx: &Context<'_>) -> async_graphql::Result<()> {
        let identity = identity_from_context(ctx)?;

        if let Err(denial) = roles::evaluate(&identity.roles, self.requirement) {
            denial.log();
            return Err(unauthorized());
        }
        Ok(())
    }
}

/// Identity Context Propagation accessor for resolvers whose guard
/// already ran. Failing here means the resolver is not guarded.
pub fn current_identity(ctx: &Context<'_>) -> async_graphql::Result<Identity> {
    ctx.data_opt::<Identity>().cloned().ok_or_else(|| {
        tracing::warn!("Resolver asked for an identity on an unguarded field");
        unauthorized()
    })
}

fn identity_from_context(ctx: &Context<'_>) -> async_graphql::Result<Identity> {
    // No envelope: the schema was executed outside the HTTP handler
    if ctx.data_opt::<RequestEnvelope>().is_none() {
        Denial::MalformedContext.log();
        return Err(unauthorized());
    }

    match ctx.data_opt::<Identity>() {
        Some(identity) => Ok(identity.clone()),
        None => {
            // Either no credential was presented or it failed to verify;
            // the handler already logged the precise reason.
            Denial::NoCredential.log();
            Err(unauthorized())
        }
    }
}

/// The uniform denial: reasons are never visible in the response
fn unauthorized() -> async_graphql::Error {
    async_graphql::Error::new("Unauthorized")
}
