//! Transport layer for launcher ↔ sandbox-runtime communication.
//!
//! Provides length-prefixed JSON framing and the stdio pipe to the spawned
//! runtime process. The launcher is the only client and drives exactly one
//! runtime, strictly sequentially.

pub mod pipe;
pub mod protocol;

pub use pipe::RuntimePipe;
pub use protocol::{RuntimeRequest, RuntimeResponse};

use anyhow::Result;

/// Maximum message size (16 MB). Safety valve against malformed frames;
/// protocol messages carry package names and source fragments, never bulk
/// data.
const MAX_MESSAGE_SIZE: u32 = 16 * 1024 * 1024;

/// Write one framed message: [4-byte big-endian length][payload bytes].
pub async fn send_message<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| anyhow::anyhow!("Frame too large: {} bytes", payload.len()))?;
    anyhow::ensure!(
        len <= MAX_MESSAGE_SIZE,
        "Frame exceeds max size: {len} > {MAX_MESSAGE_SIZE}"
    );

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message, returning the raw payload bytes.
///
/// A frame header claiming more than `MAX_MESSAGE_SIZE` is rejected without
/// reading the payload.
pub async fn recv_message<R: tokio::io::AsyncReadExt + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);

    anyhow::ensure!(
        len <= MAX_MESSAGE_SIZE,
        "Frame exceeds max size: {len} > {MAX_MESSAGE_SIZE}"
    );

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roundtrip_framing() {
        let payload = b"hello runtime";
        let mut buf = Vec::new();

        send_message(&mut buf, payload).await.unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let received = recv_message(&mut cursor).await.unwrap();
        assert_eq!(received, payload);
    }

    #[tokio::test]
    async fn empty_payload() {
        let mut buf = Vec::new();
        send_message(&mut buf, b"").await.unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let received = recv_message(&mut cursor).await.unwrap();
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        // A frame header claiming more than the maximum size must not be read
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_MESSAGE_SIZE + 1).to_be_bytes());

        let mut cursor = std::io::Cursor::new(buf);
        assert!(recv_message(&mut cursor).await.is_err());
    }

    #[tokio::test]
    async fn protocol_serialize_install() {
        let req = RuntimeRequest::Install {
            packages: vec!["pytest".to_string(), "numpy".to_string()],
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"type\":\"install\""));
        assert!(json.contains("\"pytest\""));
    }

    #[tokio::test]
    async fn protocol_serialize_run_source() {
        let req = RuntimeRequest::RunSource {
            source: "import pytest".to_string(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"type\":\"run_source\""));
    }

    #[tokio::test]
    async fn protocol_deserialize_ready() {
        let json = r#"{"type":"ready"}"#;
        let resp: RuntimeResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(resp, RuntimeResponse::Ready));
    }

    #[tokio::test]
    async fn protocol_deserialize_error() {
        let json = r#"{"type":"error","message":"boom"}"#;
        let resp: RuntimeResponse = serde_json::from_str(json).unwrap();
        match resp {
            RuntimeResponse::Error { message } => assert_eq!(message, "boom"),
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
