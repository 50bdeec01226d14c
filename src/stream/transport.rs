//! NNTP session per download and body retrieval by message-id.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::SegmentFailure;

/// One open, authenticated news server session.
///
/// Dropping the session releases the connection.
#[async_trait::async_trait]
pub trait ArticleSource: Send {
    /// Fetch the raw body of one article. `message_id` includes angle brackets.
    async fn fetch_body(&mut self, message_id: &str) -> nntp_rs::Result<Vec<u8>>;
}

/// Opens a fresh [`ArticleSource`] for each download.
#[async_trait::async_trait]
pub trait SessionOpener: Send + Sync {
    /// Connect and authenticate
    async fn open(&self) -> nntp_rs::Result<Box<dyn ArticleSource>>;
}

/// Check whether an NNTP error indicates a missing/expired article (vs connection/protocol failure).
pub(crate) fn is_missing_article_error(err: &nntp_rs::NntpError) -> bool {
    match err {
        nntp_rs::NntpError::NoSuchArticle(_) => true,
        nntp_rs::NntpError::Protocol { code, .. } if *code == 430 => true,
        other => {
            let msg = other.to_string();
            msg.contains("No such article") || msg.contains("no such article")
        }
    }
}

/// Map a fetch error onto the segment failure it represents.
pub(crate) fn classify_fetch_error(err: &nntp_rs::NntpError) -> SegmentFailure {
    if is_missing_article_error(err) {
        SegmentFailure::Missing(err.to_string())
    } else {
        SegmentFailure::Transport(err.to_string())
    }
}

/// Body bytes of a `BODY` reply.
///
/// The data is exactly what the decoder gets: the article body without its
/// headers. A 430 reply becomes [`nntp_rs::NntpError::NoSuchArticle`].
pub(crate) fn body_bytes(
    message_id: &str,
    reply: nntp_rs::Result<nntp_rs::NntpBinaryResponse>,
) -> nntp_rs::Result<Vec<u8>> {
    let err = match reply {
        Ok(response) if response.is_success() => return Ok(response.data),
        Ok(response) => nntp_rs::NntpError::Protocol {
            code: response.code,
            message: response.message,
        },
        Err(e) => e,
    };

    match err {
        nntp_rs::NntpError::Protocol { code: 430, .. } => {
            Err(nntp_rs::NntpError::NoSuchArticle(message_id.to_string()))
        }
        other => Err(other),
    }
}

/// Production [`SessionOpener`]: one `nntp_rs::NntpClient` per download.
pub struct NntpSessionOpener {
    server: ServerConfig,
}

impl NntpSessionOpener {
    /// Opener for the given news server
    pub fn new(server: ServerConfig) -> Self {
        Self { server }
    }

    async fn connect(&self) -> nntp_rs::Result<nntp_rs::NntpClient> {
        let mut client =
            nntp_rs::NntpClient::connect(Arc::new(self.server.clone().into())).await?;

        if self.server.username.is_some() {
            client.authenticate().await?;
        }

        Ok(client)
    }
}

#[async_trait::async_trait]
impl SessionOpener for NntpSessionOpener {
    async fn open(&self) -> nntp_rs::Result<Box<dyn ArticleSource>> {
        // Bounded so an unreachable server fails the request before any
        // framing is committed.
        let client = tokio::time::timeout(self.server.connect_timeout(), self.connect())
            .await
            .map_err(|_| nntp_rs::NntpError::Timeout)??;

        tracing::debug!(
            host = %self.server.host,
            port = self.server.port,
            "NNTP session opened"
        );

        Ok(Box::new(NntpSession {
            client,
            host: self.server.host.clone(),
            reply_pending: false,
        }))
    }
}

/// Session holding the request's single connection.
struct NntpSession {
    client: nntp_rs::NntpClient,
    host: String,
    /// A fetch was dropped before its reply was read (segment timeout or
    /// client gone); the connection is out of step with the server.
    reply_pending: bool,
}

#[async_trait::async_trait]
impl ArticleSource for NntpSession {
    async fn fetch_body(&mut self, message_id: &str) -> nntp_rs::Result<Vec<u8>> {
        if self.reply_pending || self.client.is_broken() {
            return Err(nntp_rs::NntpError::Other(format!(
                "connection to {} is no longer usable",
                self.host
            )));
        }

        self.reply_pending = true;
        let reply = self.client.fetch_body_binary(message_id).await;
        self.reply_pending = false;

        body_bytes(message_id, reply)
    }
}

impl Drop for NntpSession {
    fn drop(&mut self) {
        tracing::debug!(host = %self.host, "NNTP session released");
    }
}
