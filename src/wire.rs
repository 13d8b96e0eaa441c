// ============================================================================
// Authority Wire Frames
// ============================================================================
//
// Shared by the framed-TCP transport (client + server) and the queue
// transport. Frames are JSON; the TCP stream prefixes each frame with a
// 4-byte big-endian length.
//
// ============================================================================

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::identity::Identity;

/// Upper bound on a single frame. Credentials are small; anything larger
/// is a broken peer.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Verification request over the persistent TCP connection.
/// `id` correlates the reply on the shared connection.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthRequest {
    pub id: u64,
    /// The credential, forwarded unmodified
    pub token: String,
}

/// Verification reply payload, shared by the TCP and queue transports.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthReply {
    pub fn granted(identity: Identity) -> Self {
        Self {
            ok: true,
            user: Some(identity),
            error: None,
        }
    }

    pub fn denied(reason: &str) -> Self {
        Self {
            ok: false,
            user: None,
            error: Some(reason.to_string()),
        }
    }
}

/// Verification reply over the persistent TCP connection
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: u64,
    #[serde(flatten)]
    pub reply: AuthReply,
}

/// Verification request published to the durable request queue.
/// The authority pushes its reply onto the `reply_to` list.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueueAuthRequest {
    pub id: String,
    pub reply_to: String,
    pub token: String,
}

/// Email notification job consumed by notifications-service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailNotification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub async fn write_frame<W, T>(writer: &mut W, frame: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let bytes = serde_json::to_vec(frame)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    if bytes.len() > MAX_FRAME_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "frame exceeds maximum length",
        ));
    }

    writer.write_u32(bytes.len() as u32).await?;
    writer.write_all(&bytes).await?;
    writer.flush().await
}

pub async fn read_frame<R, T>(reader: &mut R) -> std::io::Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = reader.read_u32().await? as usize;

    if len > MAX_FRAME_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "frame exceeds maximum length",
        ));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;

    serde_json::from_slice(&buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    #[tokio::test]
    async fn frame_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        let request = AuthRequest {
            id: 42,
            token: "some.jwt.token".to_string(),
        };
        write_frame(&mut client, &request).await.unwrap();

        let received: AuthRequest = read_frame(&mut server).await.unwrap();
        assert_eq!(received.id, 42);
        assert_eq!(received.token, "some.jwt.token");
    }

    #[tokio::test]
    async fn response_flattens_reply_fields() {
        let identity = Identity {
            id: Uuid::new_v4(),
            email: "a@b.c".to_string(),
            roles: BTreeSet::new(),
        };
        let response = AuthResponse {
            id: 7,
            reply: AuthReply::granted(identity),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["ok"], true);
        assert!(json.get("user").is_some());
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut client, _server) = tokio::io::duplex(64);
        let request = AuthRequest {
            id: 1,
            token: "x".repeat(MAX_FRAME_LEN + 1),
        };
        assert!(write_frame(&mut client, &request).await.is_err());
    }
}
