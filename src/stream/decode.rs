//! Turning a raw article body into a [`DecodedSegment`].
//!
//! Header parsing and payload decoding are done by `nntp_rs::yenc_decode`.
//! `fetch_body_binary` hands bodies over with their line terminators removed,
//! so a body that does not decode as-is gets its `=ybegin`, `=ypart` and
//! `=yend` lines split back out before a second attempt.

use crate::error::DecodeError;
use crate::types::DecodedSegment;
use axum::body::Bytes;
use nntp_rs::YencDecoded;

/// Decodes one article body.
pub trait SegmentDecoder: Send + Sync {
    /// Decode `raw` into a segment with its metadata
    fn decode(&self, raw: &[u8]) -> Result<DecodedSegment, DecodeError>;
}

/// Production [`SegmentDecoder`] for yEnc-encoded articles.
#[derive(Clone, Copy, Debug, Default)]
pub struct YencDecoder;

impl SegmentDecoder for YencDecoder {
    fn decode(&self, raw: &[u8]) -> Result<DecodedSegment, DecodeError> {
        let decoded = match nntp_rs::yenc_decode(raw) {
            Ok(decoded) => decoded,
            Err(e) => decode_joined(raw).ok_or_else(|| DecodeError::Payload(e.to_string()))?,
        };
        segment_from(decoded)
    }
}

fn segment_from(decoded: YencDecoded) -> Result<DecodedSegment, DecodeError> {
    let declared = i64::try_from(decoded.header.size)
        .map_err(|_| DecodeError::Payload(format!("size {} out of range", decoded.header.size)))?;

    // =ypart range is 1-based and inclusive
    let nominal_size = decoded
        .part
        .as_ref()
        .and_then(|part| part.end.checked_sub(part.begin))
        .and_then(|span| span.checked_add(1))
        .and_then(|len| i64::try_from(len).ok())
        .unwrap_or(declared);

    Ok(DecodedSegment {
        number: decoded.header.part.unwrap_or(1),
        name: decoded.header.name,
        nominal_size,
        declared_output_length: declared,
        payload: Bytes::from(decoded.data),
    })
}

/// Longest `=ybegin` or `=ypart` line considered when looking for its end
const MAX_KEYWORD_LINE: usize = 1024;

/// Decode a body whose lines were joined without terminators.
///
/// `=ypart` ends the `=ybegin` line and `=yend` starts the trailer. The end of
/// the last keyword line before the data is not marked, so candidate ends are
/// tried from the longest down. A candidate is decoded only when the data
/// after it has the trailer's length, and kept only if the result agrees with
/// its own part range and CRC.
fn decode_joined(raw: &[u8]) -> Option<YencDecoded> {
    if !raw.starts_with(b"=ybegin ") || raw.contains(&b'\n') {
        return None;
    }

    let trailer_at = rfind(raw, b"=yend ")?;
    let expected = trailer_size(&raw[trailer_at..])?;
    let part_at = find(&raw[..trailer_at], b"=ypart ");

    let (open_at, shortest) = match part_at {
        Some(at) => (at, b"=ypart ".len()),
        None => (0, b"=ybegin ".len()),
    };

    // Keyword lines are text; the first invalid byte is past the line end
    let window = &raw[open_at..trailer_at];
    let window = &window[..window.len().min(MAX_KEYWORD_LINE)];
    let longest = match std::str::from_utf8(window) {
        Ok(_) => window.len(),
        Err(e) => e.valid_up_to(),
    };
    if longest < shortest {
        return None;
    }

    // '=' only appears in yEnc data as an escape prefix
    let mut escapes = raw[open_at + longest..trailer_at]
        .iter()
        .filter(|&&b| b == b'=')
        .count();

    for len in (shortest..=longest).rev() {
        let line_end = open_at + len;
        if len < longest && raw[line_end] == b'=' {
            escapes += 1;
        }
        let data_len = (trailer_at - line_end).saturating_sub(escapes) as u64;
        if data_len != expected {
            continue;
        }

        let rebuilt = rejoin(raw, part_at, line_end, trailer_at);
        if let Ok(decoded) = nntp_rs::yenc_decode(&rebuilt)
            && is_consistent(&decoded)
        {
            return Some(decoded);
        }
    }

    None
}

/// `raw` with CRLF put back around the keyword lines.
fn rejoin(raw: &[u8], part_at: Option<usize>, line_end: usize, trailer_at: usize) -> Vec<u8> {
    let mut rebuilt = Vec::with_capacity(raw.len() + 6);
    if let Some(at) = part_at {
        rebuilt.extend_from_slice(&raw[..at]);
        rebuilt.extend_from_slice(b"\r\n");
        rebuilt.extend_from_slice(&raw[at..line_end]);
    } else {
        rebuilt.extend_from_slice(&raw[..line_end]);
    }
    rebuilt.extend_from_slice(b"\r\n");
    rebuilt.extend_from_slice(&raw[line_end..trailer_at]);
    rebuilt.extend_from_slice(b"\r\n");
    rebuilt.extend_from_slice(&raw[trailer_at..]);
    rebuilt
}

/// `size=` of a `=yend` line, read by decoding it behind an empty header.
fn trailer_size(trailer: &[u8]) -> Option<u64> {
    let mut standalone = b"=ybegin line=128 size=0 name=trailer\r\n".to_vec();
    standalone.extend_from_slice(trailer);
    nntp_rs::yenc_decode(&standalone)
        .ok()
        .map(|decoded| decoded.trailer.size)
}

fn is_consistent(decoded: &YencDecoded) -> bool {
    let len = decoded.data.len() as u64;
    let range_matches = decoded.part.as_ref().is_none_or(|part| {
        part.end.checked_sub(part.begin).and_then(|span| span.checked_add(1)) == Some(len)
    });
    len == decoded.trailer.size && range_matches && decoded.verify_crc32() != Some(false)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    /// 200 bytes covering every value class, including ones yEnc escapes
    fn file_bytes() -> Vec<u8> {
        (0..200u32).map(|i| (i * 7 % 256) as u8).collect()
    }

    /// Part `number` of a two-part post of `file_bytes()`, 100 bytes each
    fn encoded_part(number: u32) -> Vec<u8> {
        let file = file_bytes();
        let begin = (number as usize - 1) * 100;
        let chunk = &file[begin..begin + 100];
        nntp_rs::yenc_encode(
            chunk,
            "clip.bin",
            128,
            Some((number, 2, begin as u64 + 1, begin as u64 + 100, 200)),
        )
        .unwrap()
    }

    /// What `fetch_body_binary` returns for `body`: lines without terminators
    fn without_line_breaks(body: &[u8]) -> Vec<u8> {
        body.split(|&b| b == b'\n')
            .flat_map(|line| line.strip_suffix(b"\r").unwrap_or(line).iter().copied())
            .collect()
    }

    #[test]
    fn decodes_multipart_segments() {
        let file = file_bytes();
        for number in [1u32, 2] {
            let segment = YencDecoder.decode(&encoded_part(number)).unwrap();
            let begin = (number as usize - 1) * 100;
            assert_eq!(segment.number, number);
            assert_eq!(segment.name, "clip.bin");
            assert_eq!(segment.nominal_size, 100);
            assert_eq!(segment.declared_output_length, 200);
            assert_eq!(&segment.payload[..], &file[begin..begin + 100]);
        }
    }

    #[test]
    fn decodes_multipart_segments_without_line_breaks() {
        let file = file_bytes();
        for number in [1u32, 2] {
            let joined = without_line_breaks(&encoded_part(number));
            let segment = YencDecoder.decode(&joined).unwrap();
            let begin = (number as usize - 1) * 100;
            assert_eq!(segment.number, number);
            assert_eq!(segment.nominal_size, 100);
            assert_eq!(segment.declared_output_length, 200);
            assert_eq!(&segment.payload[..], &file[begin..begin + 100]);
        }
    }

    #[test]
    fn single_part_post_is_part_one_of_its_whole_size() {
        let file = file_bytes();
        let body = nntp_rs::yenc_encode(&file, "clip.bin", 128, None).unwrap();

        for raw in [body.clone(), without_line_breaks(&body)] {
            let segment = YencDecoder.decode(&raw).unwrap();
            assert_eq!(segment.number, 1);
            assert_eq!(segment.name, "clip.bin");
            assert_eq!(segment.nominal_size, 200);
            assert_eq!(segment.declared_output_length, 200);
            assert_eq!(&segment.payload[..], &file[..]);
        }
    }

    #[test]
    fn article_headers_before_ybegin_are_rejected() {
        let mut article = b"Subject: clip.bin\r\nFrom: poster@example.com\r\n\r\n".to_vec();
        article.extend_from_slice(&encoded_part(1));
        assert!(matches!(
            YencDecoder.decode(&article),
            Err(DecodeError::Payload(_))
        ));
    }

    #[test]
    fn body_without_header_is_rejected() {
        assert!(matches!(
            YencDecoder.decode(b"not yenc at all"),
            Err(DecodeError::Payload(_))
        ));
    }

    #[test]
    fn joined_body_with_damaged_data_is_rejected() {
        let mut joined = without_line_breaks(&encoded_part(2));
        let trailer_at = rfind(&joined, b"=yend ").unwrap();
        joined.remove(trailer_at - 1);
        assert!(YencDecoder.decode(&joined).is_err());
    }
}
