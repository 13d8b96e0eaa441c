//! Framed-TCP frontend for the authority.
//!
//! Each connection carries length-prefixed JSON request frames; replies
//! are written back with the request's correlation id. Requests on one
//! connection are handled concurrently; ordering across requests is
//! neither guaranteed nor required.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::wire::{self, AuthReply, AuthRequest, AuthResponse};

use super::AuthorityCore;

/// Accept loop. Runs until the listener fails.
pub async fn serve(core: Arc<AuthorityCore>, listener: TcpListener) -> Result<()> {
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "Authority TCP transport listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        tracing::debug!(peer = %peer, "Authority TCP connection accepted");
        tokio::spawn(handle_connection(core.clone(), stream));
    }
}

async fn handle_connection(core: Arc<AuthorityCore>, stream: TcpStream) {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
    }

    let (mut reader, writer) = stream.into_split();
    let writer = Arc::new(Mutex::new(writer));

    loop {
        match wire::read_frame::<_, AuthRequest>(&mut reader).await {
            Ok(request) => {
                let core = core.clone();
                let writer = writer.clone();
                tokio::spawn(async move {
                    let reply = match core.authenticate(&request.token).await {
                        Ok(identity) => AuthReply::granted(identity),
                        Err(AppError::Unauthorized) => AuthReply::denied("unauthenticated"),
                        Err(e) => {
                            tracing::error!(error = %e, "Authentication failed internally");
                            AuthReply::denied("internal error")
                        }
                    };
                    let response = AuthResponse {
                        id: request.id,
                        reply,
                    };
                    write_reply(&writer, &response).await;
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                tracing::debug!("Authority TCP connection closed by peer");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping broken authority TCP connection");
                return;
            }
        }
    }
}

async fn write_reply(writer: &Arc<Mutex<OwnedWriteHalf>>, response: &AuthResponse) {
    let mut writer = writer.lock().await;
    if let Err(e) = wire::write_frame(&mut *writer, response).await {
        tracing::debug!(error = %e, "Failed to write authority reply");
    }
}
