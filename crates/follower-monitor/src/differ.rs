//! Signed delta between consecutive follower counts.

/// Return `new_count - last_count`.
///
/// Counts above `i64::MAX` saturate; no real profile gets there.
#[must_use]
pub fn diff(new_count: u64, last_count: u64) -> i64 {
    let new_count = i64::try_from(new_count).unwrap_or(i64::MAX);
    let last_count = i64::try_from(last_count).unwrap_or(i64::MAX);
    new_count.saturating_sub(last_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_diff_scenarios() {
        assert_eq!(diff(105, 100), 5);
        assert_eq!(diff(98, 105), -7);
        assert_eq!(diff(100, 100), 0);
        assert_eq!(diff(0, 0), 0);
    }

    proptest! {
        #[test]
        fn diff_is_plain_subtraction(new in 0u64..=u64::from(u32::MAX), last in 0u64..=u64::from(u32::MAX)) {
            prop_assert_eq!(diff(new, last), new as i64 - last as i64);
        }

        #[test]
        fn diff_is_antisymmetric(a in 0u64..1_000_000_000, b in 0u64..1_000_000_000) {
            prop_assert_eq!(diff(a, b), -diff(b, a));
        }

        #[test]
        fn diff_is_zero_only_for_equal_counts(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            prop_assert_eq!(diff(a, b) == 0, a == b);
        }
    }
}
