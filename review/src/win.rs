//! Win-probability model used to normalise engine scores.

use chess::Score;

use crate::types::Side;

/// Logistic slope fitted to centipawn scores.
pub const WIN_SLOPE: f64 = 0.003_682_08;
/// Centipawn scores are clamped to this magnitude before conversion.
pub const CP_CLAMP: i32 = 1000;

/// Win percentage for White in [0, 100].
///
/// A non-zero mate wins outright for the mating side. Otherwise the
/// centipawn score is clamped and mapped through a logistic curve. With
/// neither available the position is treated as level.
pub fn win_percentage(cp: Option<i32>, mate: Option<i32>) -> f64 {
    if let Some(m) = mate.filter(|&m| m != 0) {
        return if m > 0 { 100.0 } else { 0.0 };
    }

    match cp {
        Some(cp) => {
            let cp = cp.clamp(-CP_CLAMP, CP_CLAMP) as f64;
            let win_chances = 2.0 / (1.0 + (-WIN_SLOPE * cp).exp()) - 1.0;
            50.0 + 50.0 * win_chances
        }
        None => 50.0,
    }
}

/// Flip a White-perspective win percentage to the mover's perspective.
pub fn mover_relative(win: f64, side: Side) -> f64 {
    match side {
        Side::White => win,
        Side::Black => 100.0 - win,
    }
}

/// Win-percentage helpers on engine scores.
pub trait ScoreWinExt {
    /// Whether the score carries enough information for a win percentage.
    fn is_determinable(&self) -> bool;

    fn win_percentage(&self) -> f64;

    /// `Some(win%)` when determinable.
    fn determinable_win(&self) -> Option<f64> {
        self.is_determinable().then(|| self.win_percentage())
    }
}

impl ScoreWinExt for Score {
    fn is_determinable(&self) -> bool {
        match self {
            Score::Centipawns(_) => true,
            Score::Mate(m) => *m != 0,
        }
    }

    fn win_percentage(&self) -> f64 {
        win_percentage(self.cp(), self.mate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_position_is_fifty() {
        assert_eq!(win_percentage(Some(0), None), 50.0);
        assert_eq!(win_percentage(None, None), 50.0);
    }

    #[test]
    fn test_mate_is_decisive() {
        assert_eq!(win_percentage(None, Some(3)), 100.0);
        assert_eq!(win_percentage(None, Some(-1)), 0.0);
        assert_eq!(win_percentage(Some(-400), Some(2)), 100.0);
    }

    #[test]
    fn test_mate_zero_falls_back_to_cp() {
        assert_eq!(win_percentage(Some(0), Some(0)), 50.0);
        assert!(!Score::Mate(0).is_determinable());
        assert_eq!(Score::Mate(0).determinable_win(), None);
    }

    #[test]
    fn test_clamped_beyond_thousand() {
        assert_eq!(win_percentage(Some(1000), None), win_percentage(Some(5000), None));
        assert_eq!(win_percentage(Some(-1000), None), win_percentage(Some(-5000), None));
        assert!(win_percentage(Some(1000), None) > 97.0);
        assert!(win_percentage(Some(-1000), None) < 3.0);
    }

    #[test]
    fn test_known_values() {
        let w = win_percentage(Some(100), None);
        assert!((w - 59.1).abs() < 0.1, "got {w}");
        let w = win_percentage(Some(-100), None);
        assert!((w - 40.9).abs() < 0.1, "got {w}");
    }

    #[test]
    fn test_mover_relative() {
        assert_eq!(mover_relative(70.0, Side::White), 70.0);
        assert_eq!(mover_relative(70.0, Side::Black), 30.0);
    }

    #[test]
    fn test_score_ext() {
        assert_eq!(Score::Centipawns(0).win_percentage(), 50.0);
        assert_eq!(Score::Mate(-2).determinable_win(), Some(0.0));
    }
}
