//! Concrete retry delays from a `BackoffStrategy`.

use std::time::Duration;

use rand::Rng;
use waypoint_types::recovery::BackoffStrategy;

/// Delay to wait before retry `attempt` (1-based).
///
/// Starts from the deterministic curve and spreads it by up to
/// `jitter_percent` in either direction. The result never exceeds
/// `max_delay_ms`.
pub fn delay_for_attempt(backoff: &BackoffStrategy, attempt: u32) -> Duration {
    let base = backoff.base_delay_ms(attempt);
    if base == 0 || backoff.jitter_percent == 0 {
        return Duration::from_millis(base);
    }

    let spread = base as f64 * f64::from(backoff.jitter_percent.min(100)) / 100.0;
    let offset = rand::thread_rng().gen_range(-spread..=spread);
    let jittered = (base as f64 + offset).round().max(0.0) as u64;

    Duration::from_millis(jittered.min(backoff.max_delay_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_types::recovery::BackoffType;

    fn exponential(jitter_percent: u8) -> BackoffStrategy {
        BackoffStrategy {
            backoff_type: BackoffType::Exponential,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            jitter_percent,
            adaptive_adjustment: false,
        }
    }

    #[test]
    fn test_no_jitter_matches_base_curve() {
        let b = exponential(0);
        assert_eq!(delay_for_attempt(&b, 1), Duration::from_millis(1_000));
        assert_eq!(delay_for_attempt(&b, 3), Duration::from_millis(4_000));
    }

    #[test]
    fn test_jitter_stays_within_spread() {
        let b = exponential(10);
        for _ in 0..200 {
            let ms = delay_for_attempt(&b, 2).as_millis() as u64;
            assert!((1_800..=2_200).contains(&ms), "delay {ms} outside ±10% of 2000");
        }
    }

    #[test]
    fn test_jitter_never_exceeds_cap() {
        let b = exponential(50);
        for _ in 0..200 {
            assert!(delay_for_attempt(&b, 20) <= Duration::from_millis(30_000));
        }
    }

    #[test]
    fn test_none_backoff_is_zero() {
        let mut b = BackoffStrategy::none();
        b.jitter_percent = 25;
        assert_eq!(delay_for_attempt(&b, 4), Duration::ZERO);
    }
}
