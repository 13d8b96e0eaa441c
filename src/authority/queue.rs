//! Queue frontend for the authority: consumes verification requests from
//! the durable request list and answers on each request's reply list.
//!
//! Replies carry a TTL so entries abandoned by a timed-out client expire
//! on their own.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use redis::AsyncCommands;

use crate::config::Config;
use crate::error::AppError;
use crate::wire::{AuthReply, QueueAuthRequest};

use super::AuthorityCore;

// Poll granularity for the blocking pop; a small value keeps shutdown
// latency low without hammering Redis.
const POP_TIMEOUT_SECS: f64 = 5.0;

pub async fn run_worker(core: Arc<AuthorityCore>, config: &Config) -> Result<()> {
    let client =
        redis::Client::open(config.redis_url.clone()).context("Failed to parse Redis URL")?;
    let mut conn = client
        .get_connection_manager()
        .await
        .context("Failed to connect to Redis")?;

    let request_queue = config.auth_queue.request_queue.clone();
    let reply_ttl_secs = config.auth_queue.reply_ttl_secs;

    tracing::info!(queue = %request_queue, "Authority queue worker listening");

    loop {
        let popped: Option<(String, String)> =
            match conn.blpop(&request_queue, POP_TIMEOUT_SECS).await {
                Ok(value) => value,
                Err(e) => {
                    tracing::error!(error = %e, "Queue pop failed; backing off");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

        let Some((_queue, payload)) = popped else {
            continue;
        };

        let request: QueueAuthRequest = match serde_json::from_str(&payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed queue request");
                continue;
            }
        };

        let reply = match core.authenticate(&request.token).await {
            Ok(identity) => AuthReply::granted(identity),
            Err(AppError::Unauthorized) => AuthReply::denied("unauthenticated"),
            Err(e) => {
                tracing::error!(error = %e, "Authentication failed internally");
                AuthReply::denied("internal error")
            }
        };

        let reply_json = match serde_json::to_string(&reply) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode queue reply");
                continue;
            }
        };

        // Best effort: if the reply cannot be delivered the client times
        // out and denies; nothing to retry here.
        if let Err(e) = async {
            let _: () = conn.lpush(&request.reply_to, &reply_json).await?;
            let _: () = conn.expire(&request.reply_to, reply_ttl_secs).await?;
            Ok::<_, redis::RedisError>(())
        }
        .await
        {
            tracing::warn!(error = %e, request_id = %request.id, "Failed to deliver queue reply");
        }
    }
}
