//! Response framing and append-only byte emission.
//!
//! [`OutputStream`] enforces the ordering rules (framing exactly once, before
//! any byte) on top of a [`ByteSink`] backend. The production backend is
//! [`ChannelSink`], which hands the framing to the HTTP handler through a
//! oneshot and the body through a bounded mpsc channel.

use crate::error::{Error, Result};
use crate::utils::sanitize_header_filename;
use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Headers committed once per successful download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseFraming {
    /// Name announced to the client
    pub file_name: String,
    /// Exact number of body bytes that will follow
    pub content_length: u64,
}

impl ResponseFraming {
    /// `Content-Disposition` header value
    pub fn content_disposition(&self) -> String {
        format!(
            "attachment; filename={}",
            sanitize_header_filename(&self.file_name)
        )
    }
}

/// The client stopped reading the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("client disconnected")]
pub struct ClientGone;

/// Output stream misuse or client disconnect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OutputError {
    /// The client went away
    #[error(transparent)]
    ClientGone(#[from] ClientGone),

    /// Framing was committed twice
    #[error("response framing already committed")]
    AlreadyCommitted,

    /// Bytes were written before framing
    #[error("bytes written before response framing")]
    NotCommitted,
}

/// Destination for one response: framing first, then body chunks.
#[async_trait]
pub trait ByteSink: Send + Sync {
    /// Deliver status and headers
    async fn send_framing(&mut self, framing: ResponseFraming) -> std::result::Result<(), ClientGone>;

    /// Append one body chunk
    async fn send_chunk(&mut self, chunk: Bytes) -> std::result::Result<(), ClientGone>;

    /// Resolves once the client can no longer receive anything
    async fn closed(&self);
}

/// Ordered writer over a [`ByteSink`] that counts what it emits.
pub struct OutputStream<S> {
    sink: S,
    committed: bool,
    bytes_written: u64,
    zeros: Bytes,
}

impl<S: ByteSink> OutputStream<S> {
    /// Wrap `sink`; filler is emitted in chunks of at most `zero_chunk_size` bytes.
    pub fn new(sink: S, zero_chunk_size: usize) -> Self {
        Self {
            sink,
            committed: false,
            bytes_written: 0,
            zeros: Bytes::from(vec![0u8; zero_chunk_size.max(1)]),
        }
    }

    /// Commit status and headers. Allowed once.
    pub async fn commit(&mut self, framing: ResponseFraming) -> std::result::Result<(), OutputError> {
        if self.committed {
            return Err(OutputError::AlreadyCommitted);
        }
        self.sink.send_framing(framing).await?;
        self.committed = true;
        Ok(())
    }

    /// Append payload bytes, returning how many were written.
    pub async fn write(&mut self, payload: Bytes) -> std::result::Result<u64, OutputError> {
        if !self.committed {
            return Err(OutputError::NotCommitted);
        }
        if payload.is_empty() {
            return Ok(0);
        }
        let len = payload.len() as u64;
        self.sink.send_chunk(payload).await?;
        self.bytes_written += len;
        Ok(len)
    }

    /// Append `len` zero bytes, returning how many were written.
    pub async fn write_zeros(&mut self, len: u64) -> std::result::Result<u64, OutputError> {
        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(self.zeros.len() as u64) as usize;
            let zeros = self.zeros.slice(..chunk);
            self.write(zeros).await?;
            remaining -= chunk as u64;
        }
        Ok(len)
    }

    /// Resolves once the client is gone
    pub async fn closed(&self) {
        self.sink.closed().await;
    }

    /// Whether framing has been committed
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Total body bytes emitted so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Borrow the backend
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Recover the backend
    pub fn into_inner(self) -> S {
        self.sink
    }
}

/// Body chunk type carried to the HTTP layer
pub type BodyChunk = std::result::Result<Bytes, std::io::Error>;

/// Production [`ByteSink`] feeding an HTTP handler.
pub struct ChannelSink {
    framing_tx: Option<oneshot::Sender<Result<ResponseFraming>>>,
    body_tx: mpsc::Sender<BodyChunk>,
}

/// Handler side of [`channel`].
pub struct ChannelResponse {
    /// Framing, or the error that prevented any output
    pub framing: oneshot::Receiver<Result<ResponseFraming>>,
    /// Body chunks, in order
    pub body: mpsc::Receiver<BodyChunk>,
}

/// Create a connected sink/response pair buffering up to `depth` chunks.
pub fn channel(depth: usize) -> (ChannelSink, ChannelResponse) {
    let (framing_tx, framing_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(depth.max(1));
    (
        ChannelSink {
            framing_tx: Some(framing_tx),
            body_tx,
        },
        ChannelResponse {
            framing: framing_rx,
            body: body_rx,
        },
    )
}

impl ChannelSink {
    /// Report a request-terminating error instead of framing.
    ///
    /// Returns false when framing was already sent, in which case the
    /// response is already streaming and can only be cut short.
    pub fn reject(&mut self, error: Error) -> bool {
        match self.framing_tx.take() {
            Some(tx) => {
                // A dropped receiver means the client is gone; nothing to report to.
                let _ = tx.send(Err(error));
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl ByteSink for ChannelSink {
    async fn send_framing(&mut self, framing: ResponseFraming) -> std::result::Result<(), ClientGone> {
        let tx = self.framing_tx.take().ok_or(ClientGone)?;
        tx.send(Ok(framing)).map_err(|_| ClientGone)
    }

    async fn send_chunk(&mut self, chunk: Bytes) -> std::result::Result<(), ClientGone> {
        self.body_tx.send(Ok(chunk)).await.map_err(|_| ClientGone)
    }

    async fn closed(&self) {
        self.body_tx.closed().await;
    }
}
