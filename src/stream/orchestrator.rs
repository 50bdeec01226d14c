//! Sequential fetch -> decode -> emit loop over one message-id list.
//!
//! The first decoded segment gates the response: it must be part 1, and its
//! metadata fixes the file name and the declared length. From then on every
//! identifier contributes either its payload or zero filler, and whatever is
//! still owed after the last identifier is flushed as zeros, so the client
//! always receives exactly the declared number of bytes.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{DecodeError, Error, Result, SegmentFailure};
use crate::types::{
    DecodedSegment, DownloadRequest, SegmentOutcome, StreamEnd, StreamState, StreamSummary,
};

use super::decode::SegmentDecoder;
use super::gap::filler_len;
use super::output::{ByteSink, ClientGone, OutputError, OutputStream, ResponseFraming};
use super::transport::{ArticleSource, classify_fetch_error};

/// Knobs for one streaming pass
#[derive(Clone, Debug, Default)]
pub struct StreamOptions {
    /// Per-segment fetch limit (None = wait indefinitely)
    pub segment_timeout: Option<Duration>,
}

/// Running counters for the summary returned to the caller.
#[derive(Default)]
struct Tally {
    segments_decoded: usize,
    segments_filled: usize,
    filler_bytes: u64,
}

impl Tally {
    fn finish<S: ByteSink>(&self, end: StreamEnd, output: &OutputStream<S>) -> StreamSummary {
        StreamSummary {
            end,
            bytes_written: output.bytes_written(),
            segments_decoded: self.segments_decoded,
            segments_filled: self.segments_filled,
            filler_bytes: self.filler_bytes,
        }
    }

    /// Turn an output failure into the pass result: a vanished client ends
    /// the pass quietly, misuse of the stream is an internal error.
    fn stopped<S: ByteSink>(&self, err: OutputError, output: &OutputStream<S>) -> Result<StreamSummary> {
        match err {
            OutputError::ClientGone(_) => {
                tracing::debug!(
                    bytes_written = output.bytes_written(),
                    "Client disconnected, stopping download"
                );
                Ok(self.finish(StreamEnd::ClientGone, output))
            }
            other => Err(Error::Other(other.to_string())),
        }
    }
}

/// Stream the file described by `request` into `output`.
///
/// Returns `Err(Error::NotFound)` when the first identifier cannot be
/// fetched or decoded, or does not decode to part 1; nothing is written in
/// that case. Later failures are zero-filled and never surface as errors.
pub async fn stream_segments<S: ByteSink>(
    request: &DownloadRequest,
    source: &mut dyn ArticleSource,
    decoder: &Arc<dyn SegmentDecoder>,
    output: &mut OutputStream<S>,
    options: &StreamOptions,
) -> Result<StreamSummary> {
    let mut state: Option<StreamState> = None;
    let mut tally = Tally::default();

    for (index, message_id) in request.message_ids().iter().enumerate() {
        let fetched = tokio::select! {
            biased;
            () = output.closed() => None,
            outcome = fetch_segment(source, decoder, message_id, options.segment_timeout) => Some(outcome),
        };
        let Some(outcome) = fetched else {
            return tally.stopped(ClientGone.into(), output);
        };

        let Some(stream_state) = state.as_mut() else {
            let first = first_part(message_id, outcome)?;
            let framing = ResponseFraming {
                file_name: first.name.clone(),
                content_length: u64::try_from(first.declared_output_length).unwrap_or(0),
            };
            tracing::info!(
                file_name = %framing.file_name,
                content_length = framing.content_length,
                nominal_segment_size = first.nominal_size,
                segments = request.len(),
                "Streaming file"
            );
            if let Err(e) = output.commit(framing).await {
                return tally.stopped(e, output);
            }

            let mut begun = StreamState::begin(&first);
            if let Err(e) = emit_payload(output, &mut begun, first, &mut tally).await {
                return tally.stopped(e, output);
            }
            state = Some(begun);
            continue;
        };

        let result = match outcome {
            SegmentOutcome::Decoded(segment) => {
                tracing::debug!(
                    message_id = %message_id,
                    index,
                    part = segment.number,
                    bytes = segment.payload.len(),
                    "Segment decoded"
                );
                emit_payload(output, stream_state, segment, &mut tally).await
            }
            SegmentOutcome::Failed(reason) => {
                emit_filler(output, stream_state, message_id, index, &reason, &mut tally).await
            }
        };
        if let Err(e) = result {
            return tally.stopped(e, output);
        }
    }

    let Some(mut stream_state) = state else {
        return Err(Error::part_one_missing());
    };

    if stream_state.bytes_owed > 0 {
        tracing::debug!(
            bytes_owed = stream_state.bytes_owed,
            "Flushing residual zero bytes"
        );
        let residual = u64::try_from(stream_state.bytes_owed).unwrap_or(0);
        match output.write_zeros(residual).await {
            Ok(written) => {
                tally.filler_bytes += written;
                stream_state.settle(written);
            }
            Err(e) => return tally.stopped(e, output),
        }
    }
    debug_assert_eq!(stream_state.bytes_owed, 0);

    Ok(tally.finish(StreamEnd::Completed, output))
}

/// Accept the first outcome only if it is a decoded part 1.
fn first_part(message_id: &str, outcome: SegmentOutcome) -> Result<DecodedSegment> {
    match outcome {
        SegmentOutcome::Decoded(segment) if segment.number == 1 => Ok(segment),
        SegmentOutcome::Decoded(segment) => {
            tracing::warn!(
                message_id = %message_id,
                part = segment.number,
                "First segment is not part 1"
            );
            Err(Error::part_one_missing())
        }
        SegmentOutcome::Failed(reason) => {
            tracing::warn!(
                message_id = %message_id,
                reason = %reason,
                "First segment unavailable"
            );
            Err(Error::part_one_missing())
        }
    }
}

/// Write a decoded payload, clipped to what is still owed.
async fn emit_payload<S: ByteSink>(
    output: &mut OutputStream<S>,
    state: &mut StreamState,
    segment: DecodedSegment,
    tally: &mut Tally,
) -> std::result::Result<(), OutputError> {
    let admissible = state.admissible(segment.payload.len());
    if admissible < segment.payload.len() {
        tracing::warn!(
            part = segment.number,
            payload = segment.payload.len(),
            bytes_owed = state.bytes_owed,
            "Segment exceeds declared length, truncating"
        );
    }

    let written = output.write(segment.payload.slice(..admissible)).await?;
    state.settle(written);
    tally.segments_decoded += 1;
    Ok(())
}

/// Replace a lost segment with zeros of the nominal part size.
async fn emit_filler<S: ByteSink>(
    output: &mut OutputStream<S>,
    state: &mut StreamState,
    message_id: &str,
    index: usize,
    reason: &SegmentFailure,
    tally: &mut Tally,
) -> std::result::Result<(), OutputError> {
    let len = filler_len(state.nominal_segment_size, state.bytes_owed);
    tracing::warn!(
        message_id = %message_id,
        index,
        reason = %reason,
        filler = len,
        "Segment lost, zero-filling"
    );

    let written = output.write_zeros(len).await?;
    state.settle(written);
    tally.segments_filled += 1;
    tally.filler_bytes += written;
    Ok(())
}

/// Fetch and decode one identifier, folding every failure into the outcome.
async fn fetch_segment(
    source: &mut dyn ArticleSource,
    decoder: &Arc<dyn SegmentDecoder>,
    message_id: &str,
    timeout: Option<Duration>,
) -> SegmentOutcome {
    let fetch = source.fetch_body(message_id);
    let fetched = match timeout {
        Some(limit) => match tokio::time::timeout(limit, fetch).await {
            Ok(result) => result,
            Err(_) => return SegmentOutcome::Failed(SegmentFailure::TimedOut(limit)),
        },
        None => fetch.await,
    };

    let raw = match fetched {
        Ok(raw) => raw,
        Err(e) => return SegmentOutcome::Failed(classify_fetch_error(&e)),
    };

    // yEnc decode is CPU-bound; keep it off the async worker threads.
    let decoder = Arc::clone(decoder);
    match tokio::task::spawn_blocking(move || decoder.decode(&raw)).await {
        Ok(Ok(segment)) => SegmentOutcome::Decoded(segment),
        Ok(Err(e)) => SegmentOutcome::Failed(e.into()),
        Err(e) => SegmentOutcome::Failed(DecodeError::Task(e.to_string()).into()),
    }
}
