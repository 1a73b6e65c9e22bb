//! MLLP framing and the TCP implementation of [`IdentityExchange`].
//!
//! A frame is `<VT> payload <FS><CR>` (`0x0B ... 0x1C 0x0D`).

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::application::Hl7Application;
use crate::error::TransportError;
use crate::exchange::IdentityExchange;

pub const START_BLOCK: u8 = 0x0B;
pub const END_BLOCK: u8 = 0x1C;
pub const CARRIAGE_RETURN: u8 = 0x0D;

/// Upper bound for a buffered, still incomplete frame.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 3);
    frame.push(START_BLOCK);
    frame.extend_from_slice(payload);
    frame.push(END_BLOCK);
    frame.push(CARRIAGE_RETURN);
    frame
}

/// Take one complete frame off the front of `buf`.
///
/// Returns `Ok(None)` while the frame is incomplete. Bytes before the start
/// block are a framing error.
pub fn decode_frame(buf: &mut Vec<u8>) -> Result<Option<Vec<u8>>, TransportError> {
    decode_frame_from(buf, &mut 0)
}

/// [`decode_frame`] that resumes the end-block search at `scanned`.
///
/// `scanned` counts the bytes already searched without finding an end block;
/// it is updated on every call and reset once a frame is taken.
pub fn decode_frame_from(
    buf: &mut Vec<u8>,
    scanned: &mut usize,
) -> Result<Option<Vec<u8>>, TransportError> {
    let Some(&first) = buf.first() else {
        *scanned = 0;
        return Ok(None);
    };
    if first != START_BLOCK {
        return Err(TransportError::Framing(format!(
            "expected start block 0x0B, got 0x{:02X}",
            first
        )));
    }
    // The FS of a split FS CR pair may be the last byte already searched.
    let start = (*scanned).min(buf.len()).saturating_sub(1);
    match buf[start..]
        .windows(2)
        .position(|w| w[0] == END_BLOCK && w[1] == CARRIAGE_RETURN)
    {
        Some(pos) => {
            let end = start + pos;
            let payload = buf[1..end].to_vec();
            buf.drain(..end + 2);
            *scanned = 0;
            Ok(Some(payload))
        }
        None if buf.len() > MAX_FRAME_LEN => Err(TransportError::Framing(format!(
            "frame exceeds {} bytes",
            MAX_FRAME_LEN
        ))),
        None => {
            *scanned = buf.len();
            Ok(None)
        }
    }
}

// ──────────────────────────────────────────────
// MllpConnection
// ──────────────────────────────────────────────

/// An open MLLP session over TCP.
pub struct MllpConnection {
    stream: TcpStream,
    buffer: Vec<u8>,
    scanned: usize,
    peer: String,
    response_timeout: Duration,
}

impl MllpConnection {
    pub fn new(stream: TcpStream, peer: impl Into<String>, response_timeout: Duration) -> Self {
        MllpConnection {
            stream,
            buffer: Vec::new(),
            scanned: 0,
            peer: peer.into(),
            response_timeout,
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub async fn write_message(&mut self, message: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(&encode_frame(message)).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read one frame, without a timeout.
    pub async fn read_message(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(frame) = decode_frame_from(&mut self.buffer, &mut self.scanned)? {
                return Ok(frame);
            }
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(TransportError::Closed);
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    pub async fn shutdown(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(peer = %self.peer, error = %e, "MLLP shutdown failed");
        }
    }
}

// ──────────────────────────────────────────────
// MllpExchange
// ──────────────────────────────────────────────

/// [`IdentityExchange`] over MLLP/TCP.
///
/// Timeouts come from the local connection's settings, falling back to the
/// exchange defaults (10 s connect, 30 s response).
#[derive(Debug, Clone)]
pub struct MllpExchange {
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl Default for MllpExchange {
    fn default() -> Self {
        MllpExchange {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

impl MllpExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeouts(connect_timeout: Duration, response_timeout: Duration) -> Self {
        MllpExchange {
            connect_timeout,
            response_timeout,
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl IdentityExchange for MllpExchange {
    type Connection = MllpConnection;

    async fn connect(
        &self,
        local: &Hl7Application,
        remote: &Hl7Application,
    ) -> Result<MllpConnection, TransportError> {
        let cc = local.find_compatible_connection(remote)?;
        let address = cc
            .remote
            .address()
            .ok_or_else(|| TransportError::Incompatible {
                local: local.name.clone(),
                remote: remote.name.clone(),
            })?;
        let connect_timeout = cc.local.connect_timeout().unwrap_or(self.connect_timeout);
        let response_timeout = cc.local.response_timeout().unwrap_or(self.response_timeout);

        let stream = match tokio::time::timeout(connect_timeout, TcpStream::connect(&address)).await
        {
            Err(_) => {
                return Err(TransportError::Timeout {
                    operation: "connect",
                    millis: millis(connect_timeout),
                })
            }
            Ok(Err(source)) => return Err(TransportError::Connect { address, source }),
            Ok(Ok(stream)) => stream,
        };
        tracing::debug!(%address, local = %local.name, remote = %remote.name, "MLLP connection established");
        Ok(MllpConnection::new(stream, address, response_timeout))
    }

    async fn send(
        &self,
        connection: &mut MllpConnection,
        message: &[u8],
    ) -> Result<(), TransportError> {
        connection.write_message(message).await
    }

    async fn receive(&self, connection: &mut MllpConnection) -> Result<Vec<u8>, TransportError> {
        let timeout = connection.response_timeout;
        match tokio::time::timeout(timeout, connection.read_message()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                operation: "receive",
                millis: millis(timeout),
            }),
        }
    }

    async fn close(&self, connection: MllpConnection) {
        tracing::debug!(peer = %connection.peer(), "closing MLLP connection");
        connection.shutdown().await;
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wraps_payload() {
        assert_eq!(encode_frame(b"MSH"), vec![0x0B, b'M', b'S', b'H', 0x1C, 0x0D]);
    }

    #[test]
    fn decode_complete_frame_and_keep_rest() {
        let mut buf = encode_frame(b"first");
        buf.extend_from_slice(&encode_frame(b"second")[..4]);
        assert_eq!(decode_frame(&mut buf).unwrap(), Some(b"first".to_vec()));
        assert_eq!(decode_frame(&mut buf).unwrap(), None);
        assert_eq!(buf, vec![0x0B, b's', b'e', b'c']);
    }

    #[test]
    fn decode_incomplete_frame_waits() {
        let mut buf = vec![0x0B, b'a', 0x1C];
        assert_eq!(decode_frame(&mut buf).unwrap(), None);
        buf.push(0x0D);
        assert_eq!(decode_frame(&mut buf).unwrap(), Some(b"a".to_vec()));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_resumes_across_chunks() {
        let mut wire = encode_frame(b"abc");
        wire.extend_from_slice(&encode_frame(b"de"));
        let mut buf = Vec::new();
        let mut scanned = 0;
        let mut frames = Vec::new();
        for byte in wire {
            buf.push(byte);
            while let Some(frame) = decode_frame_from(&mut buf, &mut scanned).unwrap() {
                frames.push(frame);
            }
            assert!(scanned <= buf.len());
        }
        assert_eq!(frames, vec![b"abc".to_vec(), b"de".to_vec()]);
        assert!(buf.is_empty());
        assert_eq!(scanned, 0);
    }

    #[test]
    fn decode_finds_end_block_split_from_carriage_return() {
        let mut buf = vec![0x0B, b'x', b'y', 0x1C];
        let mut scanned = 0;
        assert_eq!(decode_frame_from(&mut buf, &mut scanned).unwrap(), None);
        assert_eq!(scanned, 4);
        buf.extend_from_slice(&[0x0D, 0x0B]);
        assert_eq!(
            decode_frame_from(&mut buf, &mut scanned).unwrap(),
            Some(b"xy".to_vec())
        );
        assert_eq!(buf, vec![0x0B]);
        assert_eq!(scanned, 0);
    }

    #[test]
    fn decode_empty_buffer() {
        assert_eq!(decode_frame(&mut Vec::new()).unwrap(), None);
    }

    #[test]
    fn decode_garbage_before_start_block() {
        let mut buf = b"xx".to_vec();
        let err = decode_frame(&mut buf).unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed MLLP frame: expected start block 0x0B, got 0x78"
        );
    }

    #[tokio::test]
    async fn connect_without_listening_remote_is_incompatible() {
        let local = Hl7Application::new("A|B")
            .with_connection(crate::application::Hl7Connection::new("localhost", None));
        let remote = Hl7Application::new("C|D");
        let exchange = MllpExchange::new();
        assert!(matches!(
            exchange.connect(&local, &remote).await,
            Err(TransportError::Incompatible { .. })
        ));
    }
}
