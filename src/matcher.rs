use crate::point::{Point, Tolerance};

/// Decide whether `entered` reproduces `saved` within `tolerance`.
///
/// Sequences match position by position: the i-th entered click is compared
/// against the i-th saved click, and a length mismatch never matches. Each
/// axis is checked independently and a deviation exactly equal to the
/// tolerance still passes.
pub fn matches(saved: &[Point], entered: &[Point], tolerance: Tolerance) -> bool {
    if saved.len() != entered.len() {
        return false;
    }

    saved
        .iter()
        .zip(entered.iter())
        .all(|(s, e)| (s.x - e.x).abs() <= tolerance && (s.y - e.y).abs() <= tolerance)
}

/// Largest per-axis deviation between two equal-length sequences.
///
/// Returns `None` when the lengths differ, since pairing is undefined there;
/// two empty sequences deviate by zero. Used for attempt history, never for
/// the match decision itself.
pub fn max_axis_deviation(saved: &[Point], entered: &[Point]) -> Option<i32> {
    if saved.len() != entered.len() {
        return None;
    }

    Some(
        saved
            .iter()
            .zip(entered.iter())
            .map(|(s, e)| (s.x - e.x).abs().max((s.y - e.y).abs()))
            .max()
            .unwrap_or(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(points: &[(i32, i32)]) -> Vec<Point> {
        points.iter().map(|&p| Point::from(p)).collect()
    }

    #[test]
    fn test_sequence_matches_itself_for_any_tolerance() {
        let s = seq(&[(0, 0), (10, 20), (300, 5)]);

        for t in [0, 1, 9, 10, 100] {
            assert!(matches(&s, &s, t));
        }
    }

    #[test]
    fn test_length_mismatch_never_matches() {
        let long = seq(&[(1, 1), (2, 2), (3, 3)]);
        let short = seq(&[(1, 1), (2, 2)]);

        for t in [0, 10, 1000] {
            assert!(!matches(&long, &short, t));
            assert!(!matches(&short, &long, t));
        }
    }

    #[test]
    fn test_match_is_symmetric() {
        let a = seq(&[(10, 10), (20, 20)]);
        let b = seq(&[(14, 8), (25, 22)]);

        for t in [0, 4, 5, 6, 10] {
            assert_eq!(matches(&a, &b, t), matches(&b, &a, t));
        }
    }

    #[test]
    fn test_deviation_equal_to_tolerance_passes() {
        let saved = seq(&[(10, 10)]);
        let entered = seq(&[(20, 10)]);

        assert!(matches(&saved, &entered, 10));
        assert!(!matches(&saved, &entered, 9));
    }

    #[test]
    fn test_zero_tolerance_requires_exact_equality() {
        let saved = seq(&[(3, 4), (5, 6)]);

        assert!(matches(&saved, &seq(&[(3, 4), (5, 6)]), 0));
        assert!(!matches(&saved, &seq(&[(3, 4), (5, 7)]), 0));
    }

    #[test]
    fn test_axes_are_checked_independently() {
        // Both axes off by 6: euclidean distance exceeds 6 but each axis is
        // within tolerance, so this matches.
        assert!(matches(&seq(&[(0, 0)]), &seq(&[(6, 6)]), 6));
        // One axis out is enough to fail.
        assert!(!matches(&seq(&[(0, 0)]), &seq(&[(7, 0)]), 6));
    }

    #[test]
    fn test_one_bad_pair_fails_the_whole_sequence() {
        let saved = seq(&[(5, 5), (50, 50), (100, 100)]);
        let entered = seq(&[(6, 6), (80, 50), (100, 100)]);

        assert!(!matches(&saved, &entered, 10));
    }

    #[test]
    fn test_empty_sequences_match_trivially() {
        for t in [0, 10, 500] {
            assert!(matches(&[], &[], t));
        }
    }

    #[test]
    fn test_max_axis_deviation() {
        let saved = seq(&[(5, 5), (50, 50)]);
        let entered = seq(&[(6, 6), (49, 58)]);

        assert_eq!(max_axis_deviation(&saved, &entered), Some(8));
        assert_eq!(max_axis_deviation(&saved, &saved), Some(0));
        assert_eq!(max_axis_deviation(&[], &[]), Some(0));
        assert_eq!(max_axis_deviation(&saved, &[]), None);
    }
}
