//! Epoch-time helpers.
//!
//! All wire-level timestamps are fractional epoch seconds, matching the
//! producer's encoding.

use chrono::Utc;

/// Current time as fractional epoch seconds.
#[must_use]
pub fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_seconds_is_recent() {
        let now = epoch_seconds();
        // Well after 2020-01-01, well before 2100-01-01.
        assert!(now > 1_577_836_800.0);
        assert!(now < 4_102_444_800.0);
    }

    #[test]
    fn test_epoch_seconds_monotone_enough() {
        let a = epoch_seconds();
        let b = epoch_seconds();
        assert!(b >= a);
    }
}
