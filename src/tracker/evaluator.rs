//! Progress evaluation
//!
//! Pure threshold math. Persisting the result is the store's job.

use super::error::{Result, TrackerError};

/// Outcome of applying an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub progress: u64,
    pub completed: bool,
    /// True if this increment crossed the threshold
    pub just_completed: bool,
}

/// Validate a raw increment coming from a caller
pub fn validate_increment(delta: i64) -> Result<u64> {
    u64::try_from(delta)
        .map_err(|_| TrackerError::InvalidIncrement(format!("{delta} is negative")))
}

/// Apply an increment to the current progress.
///
/// `progress = min(current + delta, max)`, `completed = progress >= max`.
/// Never decreases progress and never exceeds `max`.
pub fn evaluate(current: u64, progress_max: u64, delta: u64) -> Evaluation {
    let was_completed = current >= progress_max;
    let progress = current.saturating_add(delta).min(progress_max);
    let completed = progress >= progress_max;
    Evaluation {
        progress,
        completed,
        just_completed: completed && !was_completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_single_increments_complete_at_max() {
        let first = evaluate(0, 3, 1);
        assert_eq!((first.progress, first.completed), (1, false));

        let second = evaluate(first.progress, 3, 1);
        assert_eq!((second.progress, second.completed), (2, false));

        let third = evaluate(second.progress, 3, 1);
        assert_eq!((third.progress, third.completed), (3, true));
        assert!(third.just_completed);
    }

    #[test]
    fn test_large_increment_clamps_to_max() {
        let eval = evaluate(0, 3, 10);
        assert_eq!(eval.progress, 3);
        assert!(eval.completed);
    }

    #[test]
    fn test_increment_after_completion_stays_at_max() {
        let eval = evaluate(3, 3, 1);
        assert_eq!(eval.progress, 3);
        assert!(eval.completed);
        assert!(!eval.just_completed);
    }

    #[test]
    fn test_zero_increment_is_noop() {
        let eval = evaluate(2, 5, 0);
        assert_eq!(eval.progress, 2);
        assert!(!eval.completed);
    }

    #[test]
    fn test_overflow_saturates() {
        let eval = evaluate(u64::MAX - 1, u64::MAX, 10);
        assert_eq!(eval.progress, u64::MAX);
        assert!(eval.completed);
    }

    #[test]
    fn test_completed_iff_at_max_for_all_small_states() {
        for max in 1..6u64 {
            for current in 0..=max {
                for delta in 0..8u64 {
                    let eval = evaluate(current, max, delta);
                    assert!(eval.progress <= max);
                    assert!(eval.progress >= current);
                    assert_eq!(eval.progress, (current + delta).min(max));
                    assert_eq!(eval.completed, eval.progress >= max);
                }
            }
        }
    }

    #[test]
    fn test_validate_increment() {
        assert_eq!(validate_increment(4).unwrap(), 4);
        assert_eq!(validate_increment(0).unwrap(), 0);
        assert!(matches!(
            validate_increment(-1),
            Err(TrackerError::InvalidIncrement(_))
        ));
    }
}
