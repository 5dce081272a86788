//! Free-text payloads.
//!
//! Three length buckets, chosen purely from the sample index, so that
//! downstream parsers see both typical and oversized text fields.

/// The repeated unit of the long buckets.
pub const PAYLOAD_BLOCK: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Repetitions of [`PAYLOAD_BLOCK`] in the long bucket.
pub const LONG_REPEAT: usize = 12;

/// Repetitions of [`PAYLOAD_BLOCK`] in the very-long bucket.
pub const VERY_LONG_REPEAT: usize = 110;

/// Payload for `index`.
///
/// Every 40th index gets the very-long bucket, every other 7th index the
/// long bucket, all remaining indices a short `INFO-<index>` label.
#[must_use]
pub fn payload_for(index: usize) -> String {
    if index % 40 == 0 {
        PAYLOAD_BLOCK.repeat(VERY_LONG_REPEAT)
    } else if index % 7 == 0 {
        PAYLOAD_BLOCK.repeat(LONG_REPEAT)
    } else {
        format!("INFO-{index}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_is_36_alphanumerics() {
        assert_eq!(PAYLOAD_BLOCK.len(), 36);
        assert!(PAYLOAD_BLOCK.bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn index_zero_is_very_long() {
        assert_eq!(payload_for(0).len(), 36 * VERY_LONG_REPEAT);
    }

    #[test]
    fn index_seven_is_long() {
        assert_eq!(payload_for(7).len(), 36 * LONG_REPEAT);
        assert_eq!(payload_for(14), payload_for(7));
    }

    #[test]
    fn index_forty_is_very_long() {
        assert_eq!(payload_for(40).len(), 36 * VERY_LONG_REPEAT);
    }

    #[test]
    fn very_long_checked_before_long() {
        // 280 is a multiple of both 7 and 40.
        assert_eq!(payload_for(280).len(), 36 * VERY_LONG_REPEAT);
    }

    #[test]
    fn other_indices_are_short() {
        assert_eq!(payload_for(1), "INFO-1");
        assert_eq!(payload_for(41), "INFO-41");
    }
}
