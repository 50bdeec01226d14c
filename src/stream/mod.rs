//! Segment streaming pipeline
//!
//! A download is an ordered list of message identifiers. Each one is fetched
//! over a per-request NNTP session, yEnc-decoded and appended to the HTTP
//! response. Lost segments become zero filler of the nominal part size so
//! the output keeps its declared length and every later byte stays at the
//! right offset.
//!
//! - [`transport`] opens sessions and fetches article bodies
//! - [`decode`] turns a body into a [`DecodedSegment`](crate::types::DecodedSegment)
//! - [`gap`] sizes zero filler
//! - [`output`] enforces framing-before-bytes and carries chunks to the handler
//! - [`orchestrator`] runs the per-request loop
//! - [`service`] is what the HTTP layer calls

pub mod decode;
pub mod gap;
pub mod orchestrator;
pub mod output;
pub mod service;
pub mod transport;

pub use decode::{SegmentDecoder, YencDecoder};
pub use orchestrator::{StreamOptions, stream_segments};
pub use output::{ByteSink, ChannelResponse, ChannelSink, OutputStream, ResponseFraming};
pub use service::StreamService;
pub use transport::{ArticleSource, NntpSessionOpener, SessionOpener};
