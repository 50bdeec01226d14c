//! Per-request entry point tying a news server session to an output stream.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{DownloadRequest, StreamEnd, StreamSummary};

use super::decode::{SegmentDecoder, YencDecoder};
use super::orchestrator::{StreamOptions, stream_segments};
use super::output::{ByteSink, ChannelResponse, OutputStream, channel};
use super::transport::{NntpSessionOpener, SessionOpener};

/// Streams downloads for HTTP requests.
///
/// Shared across requests behind an `Arc`; every download opens its own
/// session through the [`SessionOpener`] and releases it when done.
pub struct StreamService {
    opener: Arc<dyn SessionOpener>,
    decoder: Arc<dyn SegmentDecoder>,
    options: StreamOptions,
    zero_chunk_size: usize,
    channel_depth: usize,
}

impl StreamService {
    /// Assemble a service from its parts
    pub fn new(
        opener: Arc<dyn SessionOpener>,
        decoder: Arc<dyn SegmentDecoder>,
        options: StreamOptions,
        zero_chunk_size: usize,
        channel_depth: usize,
    ) -> Self {
        Self {
            opener,
            decoder,
            options,
            zero_chunk_size,
            channel_depth,
        }
    }

    /// Production service: real NNTP sessions and yEnc decoding
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(NntpSessionOpener::new(config.nntp.clone())),
            Arc::new(YencDecoder),
            StreamOptions {
                segment_timeout: config.stream.segment_timeout,
            },
            config.stream.zero_chunk_size,
            config.stream.channel_depth,
        )
    }

    /// Open a session and stream `request` into `output`.
    ///
    /// The session lives exactly as long as this call.
    pub async fn stream_download<S: ByteSink>(
        &self,
        request: &DownloadRequest,
        output: &mut OutputStream<S>,
    ) -> Result<StreamSummary> {
        let mut session = self.opener.open().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to open NNTP session");
            Error::UpstreamUnavailable(e.to_string())
        })?;

        stream_segments(
            request,
            session.as_mut(),
            &self.decoder,
            output,
            &self.options,
        )
        .await
    }

    /// Run a download on a background task feeding an HTTP response.
    ///
    /// The returned [`ChannelResponse`] yields either the framing or the
    /// error that prevented it, then the body chunks.
    pub fn spawn(self: &Arc<Self>, request: DownloadRequest) -> ChannelResponse {
        let (sink, response) = channel(self.channel_depth);
        let service = Arc::clone(self);

        tokio::spawn(async move {
            let mut output = OutputStream::new(sink, service.zero_chunk_size);
            let result = service.stream_download(&request, &mut output).await;
            let mut sink = output.into_inner();

            match result {
                Ok(summary) if summary.end == StreamEnd::Completed => {
                    tracing::info!(
                        bytes_written = summary.bytes_written,
                        segments_decoded = summary.segments_decoded,
                        segments_filled = summary.segments_filled,
                        filler_bytes = summary.filler_bytes,
                        "Download streamed"
                    );
                }
                Ok(summary) => {
                    tracing::info!(
                        bytes_written = summary.bytes_written,
                        segments_decoded = summary.segments_decoded,
                        "Download abandoned by client"
                    );
                }
                Err(e) => {
                    let message = e.to_string();
                    if sink.reject(e) {
                        tracing::debug!(error = %message, "Download rejected before framing");
                    } else {
                        tracing::error!(error = %message, "Download failed after response was committed");
                    }
                }
            }
        });

        response
    }
}
