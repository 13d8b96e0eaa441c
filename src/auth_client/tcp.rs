//! Synchronous-RPC backend: one persistent TCP connection to the
//! authority, length-prefixed JSON frames, replies correlated by request
//! id so the connection is safely shared by concurrent requests.
//!
//! The connection is opened lazily on first use and re-opened on the next
//! request after a failure; a request never retries within itself.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};

use crate::guard::Denial;
use crate::identity::Identity;
use crate::wire::{self, AuthReply, AuthRequest, AuthResponse};

type PendingMap = Arc<StdMutex<HashMap<u64, oneshot::Sender<AuthReply>>>>;

pub struct TcpAuthClient {
    addr: String,
    timeout: Duration,
    next_id: AtomicU64,
    conn: Mutex<Option<SharedConn>>,
}

struct SharedConn {
    writer: OwnedWriteHalf,
    pending: PendingMap,
    alive: Arc<AtomicBool>,
}

impl TcpAuthClient {
    pub fn new(addr: String, timeout: Duration) -> Self {
        Self {
            addr,
            timeout,
            next_id: AtomicU64::new(1),
            conn: Mutex::new(None),
        }
    }

    pub async fn verify(&self, credential: &str) -> Result<Identity, Denial> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Hold the connection lock only while writing the request; the
        // wait for the reply happens outside it so other requests can
        // write concurrently.
        let (rx, pending) = {
            let mut guard = self.conn.lock().await;

            let needs_connect = match guard.as_ref() {
                Some(conn) => !conn.alive.load(Ordering::Acquire),
                None => true,
            };
            if needs_connect {
                let conn = tokio::time::timeout(self.timeout, self.connect())
                    .await
                    .map_err(|_| {
                        Denial::AuthorityUnreachable(format!("connect {}: timed out", self.addr))
                    })?
                    .map_err(|e| {
                        Denial::AuthorityUnreachable(format!("connect {}: {}", self.addr, e))
                    })?;
                *guard = Some(conn);
            }

            let conn = guard.as_mut().expect("connection was just established");
            let (tx, rx) = oneshot::channel();
            conn.pending
                .lock()
                .expect("pending map lock poisoned")
                .insert(id, tx);

            let request = AuthRequest {
                id,
                token: credential.to_string(),
            };
            if let Err(e) = wire::write_frame(&mut conn.writer, &request).await {
                conn.alive.store(false, Ordering::Release);
                conn.pending
                    .lock()
                    .expect("pending map lock poisoned")
                    .remove(&id);
                return Err(Denial::AuthorityUnreachable(format!("write: {}", e)));
            }

            (rx, conn.pending.clone())
        };

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(reply)) => reply_to_identity(reply),
            // Sender dropped: the reader task saw the connection die
            Ok(Err(_)) => Err(Denial::AuthorityUnreachable(
                "connection closed while awaiting reply".to_string(),
            )),
            Err(_) => {
                pending
                    .lock()
                    .expect("pending map lock poisoned")
                    .remove(&id);
                Err(Denial::AuthorityUnreachable(format!(
                    "no reply within {:?}",
                    self.timeout
                )))
            }
        }
    }

    async fn connect(&self) -> std::io::Result<SharedConn> {
        let stream = TcpStream::connect(&self.addr).await?;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();

        let pending: PendingMap = Arc::new(StdMutex::new(HashMap::new()));
        let alive = Arc::new(AtomicBool::new(true));

        tokio::spawn(read_loop(reader, pending.clone(), alive.clone()));

        tracing::info!(addr = %self.addr, "Connected to authentication authority");
        Ok(SharedConn {
            writer,
            pending,
            alive,
        })
    }
}

/// Routes each reply frame to the waiter registered under its id. On any
/// read error the connection is marked dead and all waiters are released
/// (their senders drop), so nobody hangs past the client timeout.
async fn read_loop(mut reader: OwnedReadHalf, pending: PendingMap, alive: Arc<AtomicBool>) {
    loop {
        match wire::read_frame::<_, AuthResponse>(&mut reader).await {
            Ok(response) => {
                let waiter = pending
                    .lock()
                    .expect("pending map lock poisoned")
                    .remove(&response.id);
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(response.reply);
                    }
                    // Late reply after the waiter timed out
                    None => tracing::debug!(id = response.id, "Dropping uncorrelated reply"),
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Authority connection closed");
                alive.store(false, Ordering::Release);
                pending.lock().expect("pending map lock poisoned").clear();
                return;
            }
        }
    }
}

fn reply_to_identity(reply: AuthReply) -> Result<Identity, Denial> {
    if reply.ok {
        reply.user.ok_or_else(|| {
            Denial::AuthorityUnreachable("authority reply missing user".to_string())
        })
    } else {
        Err(Denial::InvalidCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refused_connection_is_unreachable_not_a_panic() {
        // Nothing listens on this port
        let client = TcpAuthClient::new("127.0.0.1:1".to_string(), Duration::from_millis(200));
        let denial = client.verify("token").await.unwrap_err();
        assert!(matches!(denial, Denial::AuthorityUnreachable(_)));
    }

    #[tokio::test]
    async fn silent_server_times_out_into_denial() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        // Accept and then say nothing
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = TcpAuthClient::new(addr, Duration::from_millis(200));
        let denial = client.verify("token").await.unwrap_err();
        assert!(matches!(denial, Denial::AuthorityUnreachable(_)));
    }
}
