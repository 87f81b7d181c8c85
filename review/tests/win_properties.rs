use proptest::prelude::*;
use review::win_percentage;

proptest! {
    #[test]
    fn win_percentage_is_monotonic(a in -1000i32..=1000, b in -1000i32..=1000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(win_percentage(Some(lo), None) <= win_percentage(Some(hi), None));
    }

    #[test]
    fn win_percentage_stays_in_range(cp in any::<i32>()) {
        let w = win_percentage(Some(cp), None);
        prop_assert!((0.0..=100.0).contains(&w));
    }

    #[test]
    fn mate_score_is_decisive(m in 1i32..200, cp in any::<Option<i32>>()) {
        prop_assert_eq!(win_percentage(cp, Some(m)), 100.0);
        prop_assert_eq!(win_percentage(cp, Some(-m)), 0.0);
    }

    #[test]
    fn colors_are_symmetric(cp in -1000i32..=1000) {
        let white = win_percentage(Some(cp), None);
        let black = win_percentage(Some(-cp), None);
        prop_assert!((white + black - 100.0).abs() < 1e-9);
    }
}

#[test]
fn extremes_approach_bounds() {
    assert!(win_percentage(Some(1000), None) > 97.0);
    assert!(win_percentage(Some(-1000), None) < 3.0);
}
