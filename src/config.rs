use anyhow::Result;

// ============================================================================
// Configuration Constants
// ============================================================================

// Default port values per service
const DEFAULT_PORT: u16 = 8080;

// Credential lifetime. Expiry forces re-login; there is no refresh mechanism.
const DEFAULT_JWT_TTL_HOURS: i64 = 12;

// Bound on every remote verification, regardless of transport
const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 5;

// Queue transport defaults
const DEFAULT_AUTH_REQUEST_QUEUE: &str = "auth:requests";
const DEFAULT_AUTH_REQUEST_TTL_SECS: i64 = 60;
const DEFAULT_AUTH_REPLY_TTL_SECS: i64 = 30;

// Notifications queue
const DEFAULT_EMAIL_QUEUE: &str = "notifications:email";

// Gateway forwarding
const DEFAULT_FORWARD_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Configuration Structures
// ============================================================================

/// Which backend the Authentication Client uses to reach the authority.
/// Selected once at process start; never per-request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthTransport {
    /// Persistent framed-TCP connection with request/response correlation
    Tcp,
    /// Redis queue request/reply (durable while the authority is down)
    Queue,
    /// gRPC call against the authority's AuthService
    Grpc,
}

impl AuthTransport {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "tcp" => Ok(AuthTransport::Tcp),
            "queue" => Ok(AuthTransport::Queue),
            "grpc" => Ok(AuthTransport::Grpc),
            other => anyhow::bail!(
                "AUTH_TRANSPORT must be one of tcp, queue, grpc (got '{}')",
                other
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthTransport::Tcp => "tcp",
            AuthTransport::Queue => "queue",
            AuthTransport::Grpc => "grpc",
        }
    }
}

/// Storage backend for user and reservation records.
/// Memory mode runs the whole platform without Postgres (demos, tests).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!(
                "STORE_BACKEND must be one of postgres, memory (got '{}')",
                other
            ),
        }
    }
}

/// Queue transport configuration (request/reply over Redis lists)
#[derive(Clone, Debug)]
pub struct AuthQueueConfig {
    /// Durable list the authority consumes verification requests from
    pub request_queue: String,
    /// TTL for queued requests; expired entries are dropped by Redis
    pub request_ttl_secs: i64,
    /// TTL for per-request reply lists, so abandoned replies don't leak
    pub reply_ttl_secs: i64,
}

/// Internal service URLs the gateway proxies to
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub auth_service_url: String,
    pub reservations_service_url: String,
    pub payments_service_url: String,
    pub notifications_service_url: String,
    pub forward_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub redis_url: String,
    pub store_backend: StoreBackend,

    // Credential minting and verification
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_ttl_hours: i64,

    // Authentication Client
    pub auth_transport: AuthTransport,
    pub auth_timeout_secs: u64,
    /// Authority framed-TCP endpoint (client side) and bind address (server side)
    pub auth_tcp_addr: String,
    /// Authority gRPC endpoint, e.g. http://127.0.0.1:50051
    pub auth_grpc_endpoint: String,
    pub auth_grpc_bind: String,
    pub auth_queue: AuthQueueConfig,

    /// Trust the gateway-forwarded identity header instead of re-verifying.
    /// Only valid when the service is reachable exclusively from the gateway's
    /// private network; that boundary is a deployment invariant, not a check
    /// this process can make.
    pub gateway_trust: bool,

    pub gateway: GatewayConfig,

    /// Email notifications queue consumed by notifications-service
    pub email_queue: String,

    pub rust_log: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        Ok(Self {
            port: env_parse("PORT", DEFAULT_PORT)?,
            database_url: env_or("DATABASE_URL", ""),
            redis_url: env_or("REDIS_URL", "redis://127.0.0.1:6379"),
            store_backend: StoreBackend::parse(&env_or("STORE_BACKEND", "postgres"))?,
            jwt_secret,
            jwt_issuer: env_or("JWT_ISSUER", "staybook-auth"),
            jwt_ttl_hours: env_parse("JWT_TTL_HOURS", DEFAULT_JWT_TTL_HOURS)?,
            auth_transport: AuthTransport::parse(&env_or("AUTH_TRANSPORT", "tcp"))?,
            auth_timeout_secs: env_parse("AUTH_TIMEOUT_SECS", DEFAULT_AUTH_TIMEOUT_SECS)?,
            auth_tcp_addr: env_or("AUTH_TCP_ADDR", "127.0.0.1:7100"),
            auth_grpc_endpoint: env_or("AUTH_GRPC_ENDPOINT", "http://127.0.0.1:50051"),
            auth_grpc_bind: env_or("AUTH_GRPC_BIND", "127.0.0.1:50051"),
            auth_queue: AuthQueueConfig {
                request_queue: env_or("AUTH_REQUEST_QUEUE", DEFAULT_AUTH_REQUEST_QUEUE),
                request_ttl_secs: env_parse(
                    "AUTH_REQUEST_TTL_SECS",
                    DEFAULT_AUTH_REQUEST_TTL_SECS,
                )?,
                reply_ttl_secs: env_parse("AUTH_REPLY_TTL_SECS", DEFAULT_AUTH_REPLY_TTL_SECS)?,
            },
            gateway_trust: env_parse("GATEWAY_TRUST", false)?,
            gateway: GatewayConfig {
                auth_service_url: env_or("AUTH_SERVICE_URL", "http://127.0.0.1:8081"),
                reservations_service_url: env_or(
                    "RESERVATIONS_SERVICE_URL",
                    "http://127.0.0.1:8082",
                ),
                payments_service_url: env_or("PAYMENTS_SERVICE_URL", "http://127.0.0.1:8083"),
                notifications_service_url: env_or(
                    "NOTIFICATIONS_SERVICE_URL",
                    "http://127.0.0.1:8084",
                ),
                forward_timeout_secs: env_parse(
                    "FORWARD_TIMEOUT_SECS",
                    DEFAULT_FORWARD_TIMEOUT_SECS,
                )?,
            },
            email_queue: env_or("EMAIL_QUEUE", DEFAULT_EMAIL_QUEUE),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// A config suitable for tests and memory-mode demos: no Postgres, no
    /// secrets from the environment.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            port: 0,
            database_url: String::new(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            store_backend: StoreBackend::Memory,
            jwt_secret: jwt_secret.to_string(),
            jwt_issuer: "staybook-test".to_string(),
            jwt_ttl_hours: 1,
            auth_transport: AuthTransport::Tcp,
            auth_timeout_secs: 2,
            auth_tcp_addr: "127.0.0.1:0".to_string(),
            auth_grpc_endpoint: "http://127.0.0.1:50051".to_string(),
            auth_grpc_bind: "127.0.0.1:0".to_string(),
            auth_queue: AuthQueueConfig {
                request_queue: "test:auth:requests".to_string(),
                request_ttl_secs: 10,
                reply_ttl_secs: 10,
            },
            gateway_trust: false,
            gateway: GatewayConfig {
                auth_service_url: String::new(),
                reservations_service_url: String::new(),
                payments_service_url: String::new(),
                notifications_service_url: String::new(),
                forward_timeout_secs: 5,
            },
            email_queue: "test:notifications:email".to_string(),
            rust_log: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_parses_known_values() {
        assert_eq!(AuthTransport::parse("tcp").unwrap(), AuthTransport::Tcp);
        assert_eq!(AuthTransport::parse("QUEUE").unwrap(), AuthTransport::Queue);
        assert_eq!(AuthTransport::parse("grpc").unwrap(), AuthTransport::Grpc);
        assert!(AuthTransport::parse("carrier-pigeon").is_err());
    }

    #[test]
    fn store_backend_parses_known_values() {
        assert_eq!(
            StoreBackend::parse("postgres").unwrap(),
            StoreBackend::Postgres
        );
        assert_eq!(StoreBackend::parse("Memory").unwrap(), StoreBackend::Memory);
        assert!(StoreBackend::parse("sqlite").is_err());
    }
}
