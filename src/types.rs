//! Core types for usenet-stream

use crate::error::{Error, Result, SegmentFailure};
use axum::body::Bytes;

/// Ordered list of message identifiers making up one file.
///
/// Order is file-segment order and is preserved exactly; the list is neither
/// deduplicated nor sorted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRequest {
    message_ids: Vec<String>,
}

impl DownloadRequest {
    /// Build a request from already-normalised message identifiers
    pub fn new(message_ids: Vec<String>) -> Result<Self> {
        if message_ids.is_empty() {
            return Err(Error::BadRequest("no message ids supplied".to_string()));
        }
        Ok(Self { message_ids })
    }

    /// Parse the newline-separated `msgids` form value.
    ///
    /// One trailing newline is ignored, every line loses a trailing `\r`, and
    /// identifiers are wrapped in angle brackets for the NNTP `BODY` command.
    pub fn parse(msgids: &str) -> Result<Self> {
        let trimmed = msgids.strip_suffix('\n').unwrap_or(msgids);
        if trimmed.trim().is_empty() {
            return Err(Error::BadRequest("msgids field is empty".to_string()));
        }

        let message_ids = trimmed
            .split('\n')
            .map(|line| crate::utils::bracket_message_id(line.strip_suffix('\r').unwrap_or(line)))
            .collect();

        Self::new(message_ids)
    }

    /// Message identifiers in segment order
    pub fn message_ids(&self) -> &[String] {
        &self.message_ids
    }

    /// Number of segments requested
    pub fn len(&self) -> usize {
        self.message_ids.len()
    }

    /// Always false for a constructed request; provided for API completeness
    pub fn is_empty(&self) -> bool {
        self.message_ids.is_empty()
    }
}

/// One successfully fetched and decoded article.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedSegment {
    /// Part number, 1-based
    pub number: u32,
    /// File name announced by the poster
    pub name: String,
    /// Size of a regular (non-final) part, used to size gap filler
    pub nominal_size: i64,
    /// Size of the fully reconstructed file
    pub declared_output_length: i64,
    /// Decoded bytes of this part
    pub payload: Bytes,
}

/// Outcome of fetching and decoding a single message identifier.
#[derive(Debug)]
pub enum SegmentOutcome {
    /// Payload available
    Decoded(DecodedSegment),
    /// Nothing usable; the orchestrator zero-fills or aborts
    Failed(SegmentFailure),
}

/// Per-request byte accounting, created by the first good segment.
///
/// A state exists only once framing has been committed; the orchestrator
/// holds an `Option<StreamState>` that stays `None` until then.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamState {
    /// Nominal part size reported by the first segment
    pub nominal_segment_size: i64,
    /// Bytes still needed to reach the declared output length
    pub bytes_owed: i64,
}

impl StreamState {
    /// State right after framing was committed for `first`
    pub fn begin(first: &DecodedSegment) -> Self {
        Self {
            nominal_segment_size: first.nominal_size.max(0),
            bytes_owed: first.declared_output_length.max(0),
        }
    }

    /// Record `written` bytes as delivered. Never drops below zero.
    pub fn settle(&mut self, written: u64) {
        let written = i64::try_from(written).unwrap_or(i64::MAX);
        self.bytes_owed = self.bytes_owed.saturating_sub(written).max(0);
    }

    /// How much of a `len`-byte payload may still be written
    pub fn admissible(&self, len: usize) -> usize {
        let owed = usize::try_from(self.bytes_owed).unwrap_or(usize::MAX);
        len.min(owed)
    }
}

/// How a streaming pass ended (errors are reported separately).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamEnd {
    /// All identifiers processed and the residual flushed
    Completed,
    /// The client went away; processing stopped early
    ClientGone,
}

/// Counters describing one streaming pass, used for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamSummary {
    /// How the pass ended
    pub end: StreamEnd,
    /// Total bytes handed to the client, payload and filler
    pub bytes_written: u64,
    /// Segments whose payload was written
    pub segments_decoded: usize,
    /// Segments replaced by zero filler
    pub segments_filled: usize,
    /// Zero bytes written, gap filler plus final flush
    pub filler_bytes: u64,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_drops_single_trailing_newline_and_brackets_ids() {
        let request = DownloadRequest::parse("a@x\nb@x\n").unwrap();
        assert_eq!(request.message_ids(), &["<a@x>", "<b@x>"]);
    }

    #[test]
    fn parse_strips_carriage_returns() {
        let request = DownloadRequest::parse("a@x\r\n<b@x>\r\n").unwrap();
        assert_eq!(request.message_ids(), &["<a@x>", "<b@x>"]);
    }

    #[test]
    fn parse_keeps_order() {
        let request = DownloadRequest::parse("3@x\n1@x\n2@x").unwrap();
        assert_eq!(request.message_ids(), &["<3@x>", "<1@x>", "<2@x>"]);
        assert_eq!(request.len(), 3);
    }

    #[test]
    fn parse_rejects_empty_field() {
        for input in ["", "\n", "  \n"] {
            let err = DownloadRequest::parse(input).unwrap_err();
            assert!(matches!(err, Error::BadRequest(_)), "input {input:?}");
        }
    }

    #[test]
    fn begin_takes_sizes_from_first_segment() {
        let first = DecodedSegment {
            number: 1,
            name: "clip.bin".to_string(),
            nominal_size: 100,
            declared_output_length: 250,
            payload: Bytes::from_static(b"x"),
        };
        assert_eq!(
            StreamState::begin(&first),
            StreamState {
                nominal_segment_size: 100,
                bytes_owed: 250,
            }
        );
    }

    #[test]
    fn state_settle_never_goes_negative() {
        let mut state = StreamState {
            nominal_segment_size: 100,
            bytes_owed: 50,
        };
        state.settle(80);
        assert_eq!(state.bytes_owed, 0);
    }

    #[test]
    fn admissible_clamps_to_bytes_owed() {
        let state = StreamState {
            nominal_segment_size: 100,
            bytes_owed: 30,
        };
        assert_eq!(state.admissible(100), 30);
        assert_eq!(state.admissible(10), 10);
    }
}
