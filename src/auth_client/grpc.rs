//! Schema-typed RPC backend: the authority's `AuthService/Authenticate`
//! procedure over a shared tonic channel.
//!
//! The proto `UserMessage.id` field is mapped onto `Identity::id`, and
//! its repeated `roles` strings onto the flat role set.

use std::time::Duration;

use anyhow::{Context, Result};
use tonic::transport::{Channel, Endpoint};
use tonic::Code;
use uuid::Uuid;

use crate::config::Config;
use crate::guard::Denial;
use crate::identity::Identity;
use crate::proto::auth::v1::{auth_service_client::AuthServiceClient, Authentication};

pub struct GrpcAuthClient {
    client: AuthServiceClient<Channel>,
}

impl GrpcAuthClient {
    pub async fn connect(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.auth_timeout_secs);

        let channel = Endpoint::from_shared(config.auth_grpc_endpoint.clone())
            .context("Invalid authority gRPC endpoint")?
            .timeout(timeout)
            .connect_timeout(timeout)
            .connect()
            .await
            .context("Failed to connect to authority gRPC endpoint")?;

        tracing::info!(
            endpoint = %config.auth_grpc_endpoint,
            "Connected to authentication authority (gRPC)"
        );
        Ok(Self {
            client: AuthServiceClient::new(channel),
        })
    }

    pub async fn verify(&self, credential: &str) -> Result<Identity, Denial> {
        // The generated client needs &mut self; the channel itself
        // multiplexes, so a clone per call is cheap and correct.
        let mut client = self.client.clone();

        let response = client
            .authenticate(tonic::Request::new(Authentication {
                token: credential.to_string(),
            }))
            .await;

        match response {
            Ok(response) => {
                let user = response.into_inner();
                let id = Uuid::parse_str(&user.id).map_err(|_| {
                    Denial::AuthorityUnreachable(format!(
                        "authority returned malformed user id '{}'",
                        user.id
                    ))
                })?;
                Ok(Identity {
                    id,
                    email: user.email,
                    roles: user.roles.into_iter().collect(),
                })
            }
            Err(status) => match status.code() {
                Code::Unauthenticated | Code::PermissionDenied => Err(Denial::InvalidCredential),
                _ => Err(Denial::AuthorityUnreachable(status.to_string())),
            },
        }
    }
}
