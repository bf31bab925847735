//! Per-connection protocol state machine.
//!
//! ```text
//! Start ──handshake──→ HandshakeSent ──2 bytes──→ HeaderRead
//!                                                    │
//!              ┌───────────────┬─────────────────────┤
//!              ↓               ↓                     ↓
//!           V1Path       V2BinaryPath           V2JsonPath
//!              │               └──────────┬──────────┘
//!              │                          ↓
//!              │                  Verified | Rejected
//!              └──────────────┬───────────┘
//!                             ↓
//!                          Closed
//! ```
//!
//! One deadline covers the whole exchange and is never reset by reads.
//! Whatever the outcome, the write half is shut down before returning.
//! Failures produce no bytes on the wire; only an accepted V2 vote is
//! acknowledged.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;
use tracing::{debug, info_span, Instrument};

use crate::domain::{
    handshake_line, Challenge, Framing, V1Decoder, V2Decoder, Vote, HEADER_LEN, MAX_JSON_LINE_LEN,
    V1_BLOCK_LEN, V2_OK_RESPONSE,
};
use crate::service::context::ServerContext;
use crate::service::error::ConnectionError;

fn transport(stage: &'static str) -> impl FnOnce(std::io::Error) -> ConnectionError {
    move |source| ConnectionError::Transport { stage, source }
}

/// Drives one connection from handshake to close.
#[derive(Debug, Clone)]
pub struct ConnectionHandler {
    ctx: Arc<ServerContext>,
}

impl ConnectionHandler {
    /// Create a handler over a shared server snapshot.
    pub fn new(ctx: Arc<ServerContext>) -> Self {
        Self { ctx }
    }

    /// Run the exchange with a freshly generated challenge.
    pub async fn handle<S>(&self, stream: S, peer: SocketAddr) -> Result<Vote, ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.handle_with_challenge(stream, peer, Challenge::generate())
            .await
    }

    /// Run the exchange with a caller-supplied challenge.
    pub async fn handle_with_challenge<S>(
        &self,
        mut stream: S,
        peer: SocketAddr,
        challenge: Challenge,
    ) -> Result<Vote, ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let deadline = self.ctx.idle_timeout();
        let span = info_span!(
            "connection",
            %peer,
            id = %challenge.connection_id()
        );

        async move {
            debug!(v2 = self.ctx.v2_enabled(), "Connection opened");

            let result = match timeout(deadline, self.exchange(&mut stream, &challenge)).await {
                Ok(result) => result,
                Err(_) => Err(ConnectionError::Timeout(deadline)),
            };

            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "Shutdown after exchange failed");
            }
            debug!("Connection closed");

            result
        }
        .instrument(span)
        .await
    }

    async fn exchange<S>(&self, stream: &mut S, challenge: &Challenge) -> Result<Vote, ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        // Handshake must be on the wire before anything is read.
        let handshake = handshake_line(self.ctx.tokens(), challenge);
        stream
            .write_all(handshake.as_bytes())
            .await
            .map_err(transport("handshake write"))?;
        stream.flush().await.map_err(transport("handshake write"))?;

        let mut header = [0u8; HEADER_LEN];
        stream
            .read_exact(&mut header)
            .await
            .map_err(transport("header read"))?;

        let framing = Framing::detect(header);
        debug!(?framing, "Protocol detected");

        if !framing.is_v2() {
            return self.handle_v1(stream, header).await;
        }

        if !self.ctx.v2_enabled() {
            return Err(ConnectionError::TokensUnavailable);
        }

        let frame = match framing {
            Framing::V2Binary => read_binary_frame(stream).await?,
            _ => read_json_line(stream, header).await?,
        };
        if self.ctx.debug() {
            debug!(payload = %String::from_utf8_lossy(&frame), "V2 payload");
        }

        let vote = V2Decoder::new(self.ctx.tokens()).decode(&frame, challenge)?;
        self.ctx.sink().emit(&vote);

        // The vote is already emitted; a peer that left early does not undo it.
        if let Err(e) = write_ack(stream).await {
            debug!(error = %e, "Vote accepted but ack not delivered");
        }

        Ok(vote)
    }

    /// V1 has no acknowledgment: decode, emit, close.
    async fn handle_v1<S>(&self, stream: &mut S, header: [u8; HEADER_LEN]) -> Result<Vote, ConnectionError>
    where
        S: AsyncRead + Unpin,
    {
        let mut block = [0u8; V1_BLOCK_LEN];
        block[..HEADER_LEN].copy_from_slice(&header);
        stream
            .read_exact(&mut block[HEADER_LEN..])
            .await
            .map_err(transport("V1 block read"))?;

        let received_at = chrono::Utc::now().timestamp_millis();
        let vote = V1Decoder::new(self.ctx.keys()).decode(&block, received_at)?;
        self.ctx.sink().emit(&vote);

        Ok(vote)
    }
}

async fn write_ack<S>(stream: &mut S) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(V2_OK_RESPONSE).await?;
    stream.flush().await
}

/// `s:` already consumed: big-endian u16 length, then the payload.
async fn read_binary_frame<S>(stream: &mut S) -> Result<Vec<u8>, ConnectionError>
where
    S: AsyncRead + Unpin,
{
    let len = stream
        .read_u16()
        .await
        .map_err(transport("V2 length read"))?;
    debug!(len, "V2 binary frame");

    let mut payload = vec![0u8; usize::from(len)];
    stream
        .read_exact(&mut payload)
        .await
        .map_err(transport("V2 payload read"))?;
    Ok(payload)
}

/// The header bytes are the start of the JSON text: put them back in front
/// of the stream and read one line. A line cut short by EOF is accepted.
async fn read_json_line<S>(stream: &mut S, header: [u8; HEADER_LEN]) -> Result<Vec<u8>, ConnectionError>
where
    S: AsyncRead + Unpin,
{
    let seeded = (&header[..]).chain(&mut *stream);
    let mut reader = BufReader::new(seeded.take(MAX_JSON_LINE_LEN as u64));

    let mut line = Vec::new();
    reader
        .read_until(b'\n', &mut line)
        .await
        .map_err(transport("V2 line read"))?;

    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    } else if line.len() >= MAX_JSON_LINE_LEN {
        return Err(ConnectionError::FrameTooLarge(MAX_JSON_LINE_LEN));
    }

    Ok(line)
}
