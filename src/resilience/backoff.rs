//! Linear backoff with a ceiling.

use std::time::Duration;

/// Calculate the delay before the `attempt`-th retry.
///
/// `delay = min(attempt * step_ms, max_ms)`; attempt 0 means no delay.
pub fn calculate_backoff(attempt: u32, step_ms: u64, max_ms: u64) -> Duration {
    let delay_ms = step_ms.saturating_mul(u64::from(attempt));
    Duration::from_millis(delay_ms.min(max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(calculate_backoff(0, 250, 10_000), Duration::ZERO);
        assert_eq!(calculate_backoff(1, 250, 10_000), Duration::from_millis(250));
        assert_eq!(calculate_backoff(2, 250, 10_000), Duration::from_millis(500));
        assert_eq!(calculate_backoff(40, 250, 10_000), Duration::from_millis(10_000));
        assert_eq!(calculate_backoff(41, 250, 10_000), Duration::from_millis(10_000));
    }

    #[test]
    fn test_backoff_is_monotonic_then_clamped() {
        let mut previous = Duration::ZERO;
        for attempt in 1..=100 {
            let delay = calculate_backoff(attempt, 250, 10_000);
            assert!(delay >= previous);
            assert!(delay <= Duration::from_millis(10_000));
            previous = delay;
        }
    }

    #[test]
    fn test_backoff_saturates() {
        let delay = calculate_backoff(u32::MAX, u64::MAX, 10_000);
        assert_eq!(delay, Duration::from_millis(10_000));
    }
}
