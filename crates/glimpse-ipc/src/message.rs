//! Launch hand-off message and its binary envelope
//!
//! ```text
//! +--------+---------+-------------+----------------------------+
//! | "GLMP" | version | len (u32be) | JSON {"version","files"}   |
//! +--------+---------+-------------+----------------------------+
//! ```

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::IpcError;
use crate::Result;

const MAGIC: &[u8; 4] = b"GLMP";
const ENVELOPE_VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1 + 4;

/// Largest payload a primary will accept
pub const MAX_PAYLOAD_LEN: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMessage {
    /// Application version of the sending process
    pub version: String,
    /// Absolute paths, in command-line order
    pub files: Vec<String>,
}

impl InstanceMessage {
    pub fn new(version: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            version: version.into(),
            files,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = serde_json::to_vec(self)?;
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(IpcError::PayloadTooLarge(payload.len()));
        }

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.push(ENVELOPE_VERSION);
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(IpcError::Truncated);
        }

        let (header, payload) = bytes.split_at(HEADER_LEN);
        let len = parse_header(header)?;
        if payload.len() < len {
            return Err(IpcError::Truncated);
        }

        Ok(serde_json::from_slice(&payload[..len])?)
    }
}

fn parse_header(header: &[u8]) -> Result<usize> {
    if &header[..MAGIC.len()] != MAGIC {
        return Err(IpcError::BadMagic);
    }

    let version = header[MAGIC.len()];
    if version != ENVELOPE_VERSION {
        return Err(IpcError::UnsupportedEnvelope(version));
    }

    let mut len = [0u8; 4];
    len.copy_from_slice(&header[MAGIC.len() + 1..HEADER_LEN]);
    let len = u32::from_be_bytes(len) as usize;
    if len > MAX_PAYLOAD_LEN {
        return Err(IpcError::PayloadTooLarge(len));
    }

    Ok(len)
}

pub async fn write_envelope<W>(writer: &mut W, message: &InstanceMessage) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = message.encode()?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one envelope. Returns `None` if the peer hung up before sending
/// anything.
pub async fn read_envelope<R>(reader: &mut R) -> Result<Option<InstanceMessage>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            return if filled == 0 {
                Ok(None)
            } else {
                Err(IpcError::Truncated)
            };
        }
        filled += n;
    }

    let len = parse_header(&header)?;
    let mut frame = vec![0u8; HEADER_LEN + len];
    frame[..HEADER_LEN].copy_from_slice(&header);
    reader
        .read_exact(&mut frame[HEADER_LEN..])
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                IpcError::Truncated
            } else {
                IpcError::Io(e)
            }
        })?;

    InstanceMessage::decode(&frame).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InstanceMessage {
        InstanceMessage::new(
            "1.2.0",
            vec!["/var/log/a.log".to_string(), "/var/log/b.log".to_string()],
        )
    }

    #[test]
    fn test_payload_is_json_with_version_and_files() {
        let bytes = sample().encode().unwrap();
        assert_eq!(&bytes[..4], b"GLMP");
        assert_eq!(bytes[4], 1);

        let payload: serde_json::Value = serde_json::from_slice(&bytes[HEADER_LEN..]).unwrap();
        assert_eq!(payload["version"], "1.2.0");
        assert_eq!(payload["files"][1], "/var/log/b.log");
    }

    #[test]
    fn test_decode_rejects_foreign_bytes() {
        let mut bytes = sample().encode().unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            InstanceMessage::decode(&bytes),
            Err(IpcError::BadMagic)
        ));

        let mut bytes = sample().encode().unwrap();
        bytes[4] = 9;
        assert!(matches!(
            InstanceMessage::decode(&bytes),
            Err(IpcError::UnsupportedEnvelope(9))
        ));

        let bytes = sample().encode().unwrap();
        assert!(matches!(
            InstanceMessage::decode(&bytes[..bytes.len() - 1]),
            Err(IpcError::Truncated)
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_length() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.push(ENVELOPE_VERSION);
        bytes.extend_from_slice(&((MAX_PAYLOAD_LEN as u32) + 1).to_be_bytes());

        assert!(matches!(
            InstanceMessage::decode(&bytes),
            Err(IpcError::PayloadTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_stream_envelope() {
        let (mut client, mut server) = tokio::io::duplex(64);

        let writer = tokio::spawn(async move {
            write_envelope(&mut client, &sample()).await.unwrap();
        });

        let received = read_envelope(&mut server).await.unwrap();
        writer.await.unwrap();
        assert_eq!(received, Some(sample()));

        // Writer side is gone: clean end of stream
        assert_eq!(read_envelope(&mut server).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stream_truncated_header() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(b"GLM").await.unwrap();
        drop(client);

        assert!(matches!(
            read_envelope(&mut server).await,
            Err(IpcError::Truncated)
        ));
    }

    #[tokio::test]
    async fn test_stream_payload_checked_like_buffered_decode() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(MAGIC).await.unwrap();
        client.write_all(&[ENVELOPE_VERSION]).await.unwrap();
        client.write_all(&4u32.to_be_bytes()).await.unwrap();
        client.write_all(b"nope").await.unwrap();
        drop(client);

        assert!(matches!(
            read_envelope(&mut server).await,
            Err(IpcError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_stream_truncated_payload() {
        let bytes = sample().encode().unwrap();
        let (mut client, mut server) = tokio::io::duplex(4096);
        client.write_all(&bytes[..bytes.len() - 3]).await.unwrap();
        drop(client);

        assert!(matches!(
            read_envelope(&mut server).await,
            Err(IpcError::Truncated)
        ));
    }
}
