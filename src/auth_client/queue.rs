//! Message-queue backend: request/reply over Redis lists.
//!
//! Requests are pushed onto a durable queue the authority consumes; the
//! reply comes back on a per-request list named in the frame. Requests
//! survive an authority restart for as long as their TTL allows. The
//! trade is latency for resilience, and it happens entirely below the
//! guard's visibility.

use anyhow::{Context, Result};
use redis::AsyncCommands;
use uuid::Uuid;

use crate::config::Config;
use crate::guard::Denial;
use crate::identity::Identity;
use crate::wire::{AuthReply, QueueAuthRequest};

pub struct QueueAuthClient {
    conn: redis::aio::ConnectionManager,
    request_queue: String,
    request_ttl_secs: i64,
    timeout_secs: u64,
}

impl QueueAuthClient {
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.clone())
            .context("Failed to parse Redis URL")?;

        let conn = client
            .get_connection_manager()
            .await
            .context("Failed to connect to Redis")?;

        Ok(Self {
            conn,
            request_queue: config.auth_queue.request_queue.clone(),
            request_ttl_secs: config.auth_queue.request_ttl_secs,
            timeout_secs: config.auth_timeout_secs,
        })
    }

    pub async fn verify(&self, credential: &str) -> Result<Identity, Denial> {
        let id = Uuid::new_v4().to_string();
        let reply_to = format!("auth:reply:{}", id);

        let request = QueueAuthRequest {
            id,
            reply_to: reply_to.clone(),
            token: credential.to_string(),
        };
        let payload = serde_json::to_string(&request)
            .map_err(|e| Denial::AuthorityUnreachable(format!("encode request: {}", e)))?;

        // The manager multiplexes; a clone per call is the intended use
        let mut conn = self.conn.clone();

        let _: () = conn
            .lpush(&self.request_queue, payload)
            .await
            .map_err(|e| Denial::AuthorityUnreachable(format!("publish: {}", e)))?;
        // Keep the request queue from growing unbounded while the
        // authority is down; expired requests are simply dropped.
        let _: () = conn
            .expire(&self.request_queue, self.request_ttl_secs)
            .await
            .map_err(|e| Denial::AuthorityUnreachable(format!("expire: {}", e)))?;

        let reply: Option<(String, String)> = conn
            .blpop(&reply_to, self.timeout_secs as f64)
            .await
            .map_err(|e| Denial::AuthorityUnreachable(format!("await reply: {}", e)))?;

        match reply {
            Some((_list, payload)) => {
                let reply: AuthReply = serde_json::from_str(&payload).map_err(|e| {
                    Denial::AuthorityUnreachable(format!("malformed reply: {}", e))
                })?;
                if reply.ok {
                    reply.user.ok_or_else(|| {
                        Denial::AuthorityUnreachable("authority reply missing user".to_string())
                    })
                } else {
                    Err(Denial::InvalidCredential)
                }
            }
            None => Err(Denial::AuthorityUnreachable(format!(
                "no reply within {}s",
                self.timeout_secs
            ))),
        }
    }
}
