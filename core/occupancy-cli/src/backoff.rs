use std::cmp;
use std::time::Duration;

const FAILURE_THRESHOLD: u32 = 3;
const BACKOFF_STEP_SECS: u64 = 10;
const BACKOFF_MAX_SECS: u64 = 60;

/// Delay before the next refresh after `consecutive_failures` failed polls.
pub fn refresh_delay(base: Duration, consecutive_failures: u32) -> Duration {
    if consecutive_failures <= FAILURE_THRESHOLD {
        return base;
    }

    let extra = u64::from(consecutive_failures.saturating_sub(FAILURE_THRESHOLD));
    let backoff = BACKOFF_STEP_SECS.saturating_mul(extra);
    base + Duration::from_secs(cmp::min(backoff, BACKOFF_MAX_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_secs(30);

    #[test]
    fn no_backoff_below_threshold() {
        for failures in 0..=FAILURE_THRESHOLD {
            assert_eq!(refresh_delay(BASE, failures), BASE);
        }
    }

    #[test]
    fn backoff_grows_per_failure() {
        assert_eq!(
            refresh_delay(BASE, FAILURE_THRESHOLD + 1),
            BASE + Duration::from_secs(BACKOFF_STEP_SECS)
        );
        assert_eq!(
            refresh_delay(BASE, FAILURE_THRESHOLD + 2),
            BASE + Duration::from_secs(2 * BACKOFF_STEP_SECS)
        );
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(
            refresh_delay(BASE, u32::MAX),
            BASE + Duration::from_secs(BACKOFF_MAX_SECS)
        );
    }
}
