//! Zero-fill policy for segments that could not be fetched or decoded.
//!
//! A lost segment is replaced by zeros of the nominal part size so the file
//! keeps its declared length and every later part lands at the right offset.
//! The nominal size comes from the first decoded segment; a failed fetch has
//! no size of its own.

/// Number of zero bytes to emit for one lost segment.
///
/// `min(nominal_segment_size, bytes_owed)`, never negative.
#[must_use]
pub fn filler_len(nominal_segment_size: i64, bytes_owed: i64) -> u64 {
    let len = nominal_segment_size.min(bytes_owed).max(0);
    u64::try_from(len).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_a_full_part_when_enough_is_owed() {
        assert_eq!(filler_len(100, 300), 100);
    }

    #[test]
    fn fills_only_what_is_owed_near_the_end() {
        assert_eq!(filler_len(100, 37), 37);
    }

    #[test]
    fn nothing_owed_means_no_filler() {
        assert_eq!(filler_len(100, 0), 0);
    }

    #[test]
    fn negative_inputs_clamp_to_zero() {
        assert_eq!(filler_len(-5, 300), 0);
        assert_eq!(filler_len(100, -1), 0);
    }
}
