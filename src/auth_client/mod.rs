// ============================================================================
// Authentication Client
// ============================================================================
//
// Transport-agnostic facade over the remote authority. Three backends
// with one contract: verify(credential) -> Identity or a denial.
//
// The backend is selected once from configuration at process start; the
// underlying connection or channel is process-scoped and reused across
// requests. Verification is read-only and idempotent, so concurrent
// reuse needs no per-request locking.
//
// No backend ever panics or surfaces an unhandled fault to the guard:
// timeouts, refused connections and authority rejections all normalize
// into `Denial`.
//
// ============================================================================

pub mod grpc;
pub mod queue;
pub mod tcp;

pub use grpc::GrpcAuthClient;
pub use queue::QueueAuthClient;
pub use tcp::TcpAuthClient;

use anyhow::Result;

use crate::config::{AuthTransport, Config};
use crate::guard::Denial;
use crate::identity::Identity;

/// Tagged transport strategy behind the single `verify` contract
pub enum AuthClient {
    Tcp(TcpAuthClient),
    Queue(QueueAuthClient),
    Grpc(GrpcAuthClient),
}

impl AuthClient {
    /// Builds the backend named by `AUTH_TRANSPORT`. Called once at
    /// process start.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let client = match config.auth_transport {
            AuthTransport::Tcp => AuthClient::Tcp(TcpAuthClient::new(
                config.auth_tcp_addr.clone(),
                std::time::Duration::from_secs(config.auth_timeout_secs),
            )),
            AuthTransport::Queue => AuthClient::Queue(QueueAuthClient::connect(config).await?),
            AuthTransport::Grpc => AuthClient::Grpc(GrpcAuthClient::connect(config).await?),
        };

        tracing::info!(
            transport = config.auth_transport.as_str(),
            "Authentication client ready"
        );
        Ok(client)
    }

    /// Sends the credential to the authority and awaits the resolved
    /// identity. At most one call is in flight per incoming request.
    pub async fn verify(&self, credential: &str) -> Result<Identity, Denial> {
        match self {
            AuthClient::Tcp(client) => client.verify(credential).await,
            AuthClient::Queue(client) => client.verify(credential).await,
            AuthClient::Grpc(client) => client.verify(credential).await,
        }
    }
}
