//! Email notification collaborators.
//!
//! Producers publish `EmailNotification` jobs onto a Redis list; the
//! notifications-service worker consumes them and hands each to the
//! `Mailer`. Actual delivery is an external concern; the demo mailer
//! writes to the log.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;

use crate::config::Config;
use crate::wire::EmailNotification;

// Undelivered notifications expire rather than accumulate
const QUEUE_TTL_SECS: i64 = 7 * 86400;

const POP_TIMEOUT_SECS: f64 = 5.0;

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, notification: &EmailNotification) -> Result<()>;
}

/// Demo mailer: records the email in the log instead of delivering it
#[derive(Default)]
pub struct TracingMailer;

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, notification: &EmailNotification) -> Result<()> {
        tracing::info!(
            to = %notification.to,
            subject = %notification.subject,
            "Email notification sent"
        );
        Ok(())
    }
}

/// Producer handle for the email queue
#[derive(Clone)]
pub struct NotificationQueue {
    conn: redis::aio::ConnectionManager,
    queue: String,
}

impl NotificationQueue {
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.clone())
            .context("Failed to parse Redis URL")?;
        let conn = client
            .get_connection_manager()
            .await
            .context("Failed to connect to Redis")?;

        Ok(Self {
            conn,
            queue: config.email_queue.clone(),
        })
    }

    pub async fn publish(&self, notification: &EmailNotification) -> Result<()> {
        let payload = serde_json::to_string(notification)?;
        let mut conn = self.conn.clone();
        let _: () = conn.lpush(&self.queue, payload).await?;
        let _: () = conn.expire(&self.queue, QUEUE_TTL_SECS).await?;
        Ok(())
    }
}

/// Consumer loop run by notifications-service
pub async fn run_email_worker(config: &Config, mailer: Arc<dyn Mailer>) -> Result<()> {
    let client =
        redis::Client::open(config.redis_url.clone()).context("Failed to parse Redis URL")?;
    let mut conn = client
        .get_connection_manager()
        .await
        .context("Failed to connect to Redis")?;

    tracing::info!(queue = %config.email_queue, "Email worker listening");

    loop {
        let popped: Option<(String, String)> =
            match conn.blpop(&config.email_queue, POP_TIMEOUT_SECS).await {
                Ok(value) => value,
                Err(e) => {
                    tracing::error!(error = %e, "Email queue pop failed; backing off");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

        let Some((_queue, payload)) = popped else {
            continue;
        };

        let notification: EmailNotification = match serde_json::from_str(&payload) {
            Ok(notification) => notification,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed email job");
                continue;
            }
        };

        if let Err(e) = mailer.send(&notification).await {
            tracing::error!(error = %e, to = %notification.to, "Email delivery failed");
        }
    }
}
