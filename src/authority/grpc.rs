//! gRPC frontend for the authority: the generated `AuthService` served
//! from the same core as every other transport.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::error::AppError;
use crate::proto::auth::v1::{
    auth_service_server::{AuthService, AuthServiceServer},
    Authentication, UserMessage,
};

use super::AuthorityCore;

pub struct GrpcAuthority {
    core: Arc<AuthorityCore>,
}

pub fn service(core: Arc<AuthorityCore>) -> AuthServiceServer<GrpcAuthority> {
    AuthServiceServer::new(GrpcAuthority { core })
}

#[tonic::async_trait]
impl AuthService for GrpcAuthority {
    async fn authenticate(
        &self,
        request: Request<Authentication>,
    ) -> Result<Response<UserMessage>, Status> {
        let token = request.into_inner().token;

        match self.core.authenticate(&token).await {
            Ok(identity) => Ok(Response::new(UserMessage {
                id: identity.id.to_string(),
                email: identity.email,
                roles: identity.roles.into_iter().collect(),
            })),
            Err(AppError::Unauthorized) => Err(Status::unauthenticated("Unauthorized")),
            Err(e) => {
                tracing::error!(error = %e, "Authentication failed internally");
                Err(Status::internal("internal error"))
            }
        }
    }
}
