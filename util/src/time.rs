//! General time utility functions

use std::time::Duration;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    if let Some(ns) = duration.num_nanoseconds() {
        Some(ns as f64 / NANOS_PER_SECOND as f64)
    }
    else {
        None
    }
}

/// Build a std `Duration` from a number of seconds.
///
/// Negative and NaN values give zero, values too large for a `Duration` (including infinity) give
/// `Duration::MAX`.
pub fn seconds_to_std(seconds: f64) -> Duration {
    if !(seconds > 0.0) {
        return Duration::from_secs(0)
    }

    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(duration_to_seconds(chrono::Duration::milliseconds(1500)), Some(1.5));
        assert_eq!(duration_to_seconds(chrono::Duration::max_value()), None);
    }

    #[test]
    fn test_seconds_to_std() {
        assert_eq!(seconds_to_std(0.25), Duration::from_millis(250));
        assert_eq!(seconds_to_std(-1.0), Duration::from_secs(0));
        assert_eq!(seconds_to_std(f64::NAN), Duration::from_secs(0));
        assert_eq!(seconds_to_std(1e20), Duration::MAX);
        assert_eq!(seconds_to_std(f64::INFINITY), Duration::MAX);
    }
}
