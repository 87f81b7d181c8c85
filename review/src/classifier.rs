//! Move classification as an ordered pipeline of pure stages.
//!
//! Missed mates short-circuit to [`MoveCategory::Miss`]. Otherwise a base
//! tier is computed from the win-percentage swing (or CPL bands), then the
//! brilliant, great and best stages may each override it. The opening-book
//! check runs last and always wins.

use crate::book::OpeningBook;
use crate::heuristics::{is_book_move, is_piece_sacrifice, is_simple_recapture};
use crate::types::{MoveCategory, Side};
use crate::win::{mover_relative, win_percentage};

/// Mover-relative win% gain a move must exceed to count as great.
const GREAT_SWING: f64 = 10.0;
/// Smallest allowed win-percentage loss for a brilliant move.
const BRILLIANT_MAX_LOSS: f64 = -2.0;
/// An alternative this close to 0/100 already decides the game.
const DECISIVE_MARGIN: f64 = 3.0;

/// Everything the classifier looks at for one move.
#[derive(Debug, Clone, Default)]
pub struct ClassificationInput<'a> {
    pub cpl: Option<i32>,
    pub cp_before_white: Option<i32>,
    pub cp_after_white: Option<i32>,
    pub mate_before: Option<i32>,
    pub mate_after: Option<i32>,
    pub side: Side,
    /// The best line mates and the played move is not it.
    pub missed_mate: bool,
    /// White-perspective win% of the first engine line not starting with
    /// the played move.
    pub alternative_line_win_pct: Option<f64>,
    /// Mover-relative win% change caused by the move.
    pub win_percentage_diff: Option<f64>,
    pub fen_before: &'a str,
    pub fen_after: &'a str,
    pub move_uci: &'a str,
    /// Engine continuation expected after the played move.
    pub best_line_pv: &'a [String],
    pub fen_two_plies_ago: Option<&'a str>,
    pub uci_moves_two_ago: Option<[&'a str; 2]>,
    pub is_best_move: bool,
}

impl ClassificationInput<'_> {
    fn win_before(&self) -> Option<f64> {
        determinable_win(self.cp_before_white, self.mate_before)
    }

    fn win_after(&self) -> Option<f64> {
        determinable_win(self.cp_after_white, self.mate_after)
    }

    /// Mover-relative win% before and after the move, when both are known.
    fn win_swing(&self) -> Option<(f64, f64)> {
        let before = mover_relative(self.win_before()?, self.side);
        let after = mover_relative(self.win_after()?, self.side);
        Some((before, after))
    }
}

fn determinable_win(cp: Option<i32>, mate: Option<i32>) -> Option<f64> {
    let has_mate = mate.is_some_and(|m| m != 0);
    (has_mate || cp.is_some()).then(|| win_percentage(cp, mate))
}

/// Result of classifying one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// What gets displayed.
    pub category: MoveCategory,
    /// Category before the opening-book override.
    pub underlying: MoveCategory,
    pub missed_mate: bool,
    pub book: bool,
}

/// What a stage decides about the current category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Override(MoveCategory),
}

/// Category state threaded through the upgrade stages.
#[derive(Debug, Clone, Copy)]
struct Tier {
    base: MoveCategory,
    current: MoveCategory,
}

impl Tier {
    fn untouched(&self) -> bool {
        self.current == self.base
    }
}

type Stage = fn(&ClassificationInput<'_>, Tier) -> Verdict;

const UPGRADE_STAGES: [Stage; 3] = [brilliant_check, great_check, best_tie_break];

pub fn classify(input: &ClassificationInput<'_>, book: &OpeningBook) -> Classification {
    let underlying = if input.missed_mate {
        MoveCategory::Miss
    } else {
        let base = base_tier(input);
        UPGRADE_STAGES.iter().fold(base, |current, stage| {
            match stage(input, Tier { base, current }) {
                Verdict::Keep => current,
                Verdict::Override(category) => category,
            }
        })
    };

    let (category, book) = match book_override(input, book) {
        Verdict::Override(category) => (category, true),
        Verdict::Keep => (underlying, false),
    };

    Classification {
        category,
        underlying,
        missed_mate: input.missed_mate,
        book,
    }
}

/// Tier from the mover-relative win% swing, or CPL bands when the swing
/// cannot be computed.
pub fn base_tier(input: &ClassificationInput<'_>) -> MoveCategory {
    match input.win_swing() {
        Some((before, after)) => match after - before {
            d if d < -20.0 => MoveCategory::Blunder,
            d if d < -10.0 => MoveCategory::Mistake,
            d if d < -5.0 => MoveCategory::Inaccuracy,
            d if d < -2.0 => MoveCategory::Good,
            _ => MoveCategory::Excellent,
        },
        None => cpl_band(input.cpl),
    }
}

/// Fallback tier from centipawn loss alone.
pub fn cpl_band(cpl: Option<i32>) -> MoveCategory {
    match cpl {
        None => MoveCategory::Good,
        Some(c) if c <= 0 => MoveCategory::Best,
        Some(c) if c <= 20 => MoveCategory::Excellent,
        Some(c) if c <= 60 => MoveCategory::Good,
        Some(c) if c <= 120 => MoveCategory::Inaccuracy,
        Some(c) if c <= 300 => MoveCategory::Mistake,
        Some(_) => MoveCategory::Blunder,
    }
}

/// The mover is not losing after the move, and the alternative (if any) is
/// not already decided in the opponent's favour.
fn upgrade_guards_hold(input: &ClassificationInput<'_>) -> bool {
    let Some(after) = input.win_after() else {
        return false;
    };
    let alt = input.alternative_line_win_pct;

    match input.side {
        Side::White => after >= 50.0 && alt.map_or(true, |a| a >= DECISIVE_MARGIN),
        Side::Black => after <= 50.0 && alt.map_or(true, |a| a <= 100.0 - DECISIVE_MARGIN),
    }
}

fn brilliant_check(input: &ClassificationInput<'_>, tier: Tier) -> Verdict {
    if matches!(tier.base, MoveCategory::Blunder | MoveCategory::Miss) {
        return Verdict::Keep;
    }
    if input.alternative_line_win_pct.is_none() {
        return Verdict::Keep;
    }
    if !input
        .win_percentage_diff
        .is_some_and(|d| d >= BRILLIANT_MAX_LOSS)
    {
        return Verdict::Keep;
    }
    if !upgrade_guards_hold(input) {
        return Verdict::Keep;
    }

    if is_piece_sacrifice(input.fen_before, input.move_uci, input.best_line_pv) {
        Verdict::Override(MoveCategory::Brilliant)
    } else {
        Verdict::Keep
    }
}

fn great_check(input: &ClassificationInput<'_>, tier: Tier) -> Verdict {
    if !tier.untouched() || !upgrade_guards_hold(input) {
        return Verdict::Keep;
    }

    if let (Some(fen), Some(moves)) = (input.fen_two_plies_ago, input.uci_moves_two_ago) {
        if is_simple_recapture(fen, moves) {
            return Verdict::Keep;
        }
    }

    let Some((before, after)) = input.win_swing() else {
        return Verdict::Keep;
    };

    // Turned a worse position into a better one
    let turned_around = before < 50.0 && after >= 50.0 && after - before > GREAT_SWING;

    // Only move: every alternative is clearly worse
    let only_move = input
        .alternative_line_win_pct
        .is_some_and(|alt| after - mover_relative(alt, input.side) > GREAT_SWING);

    if turned_around || only_move {
        Verdict::Override(MoveCategory::Great)
    } else {
        Verdict::Keep
    }
}

fn best_tie_break(input: &ClassificationInput<'_>, tier: Tier) -> Verdict {
    if tier.untouched() && input.is_best_move && input.cpl == Some(0) {
        Verdict::Override(MoveCategory::Best)
    } else {
        Verdict::Keep
    }
}

fn book_override(input: &ClassificationInput<'_>, book: &OpeningBook) -> Verdict {
    if is_book_move(input.fen_after, book) {
        Verdict::Override(MoveCategory::Book)
    } else {
        Verdict::Keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITALIAN: &str = "r1bqk1nr/pppp1ppp/2n5/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";
    const AFTER_BXF7: &str = "r1bqk1nr/pppp1Bpp/2n5/2b1p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 0 4";
    const SCOTCH_EXD4: &str = "r1bqkbnr/pppp1ppp/2n5/8/3pP3/5N2/PPP2PPP/RNBQKB1R w KQkq - 0 4";

    fn quiet_input<'a>(cp_before: i32, cp_after: i32, side: Side) -> ClassificationInput<'a> {
        let before = win_percentage(Some(cp_before), None);
        let after = win_percentage(Some(cp_after), None);
        ClassificationInput {
            cpl: Some(0),
            cp_before_white: Some(cp_before),
            cp_after_white: Some(cp_after),
            side,
            win_percentage_diff: Some(mover_relative(after, side) - mover_relative(before, side)),
            fen_before: chess::STARTING_FEN,
            fen_after: "8/8/8/8/8/8/8/K6k w - - 0 1",
            move_uci: "e2e4",
            ..Default::default()
        }
    }

    #[test]
    fn test_cpl_bands() {
        assert_eq!(cpl_band(None), MoveCategory::Good);
        assert_eq!(cpl_band(Some(0)), MoveCategory::Best);
        assert_eq!(cpl_band(Some(20)), MoveCategory::Excellent);
        assert_eq!(cpl_band(Some(21)), MoveCategory::Good);
        assert_eq!(cpl_band(Some(60)), MoveCategory::Good);
        assert_eq!(cpl_band(Some(120)), MoveCategory::Inaccuracy);
        assert_eq!(cpl_band(Some(300)), MoveCategory::Mistake);
        assert_eq!(cpl_band(Some(301)), MoveCategory::Blunder);
    }

    #[test]
    fn test_base_tier_from_win_swing() {
        let book = OpeningBook::empty();
        // 0 -> -300 for White is a large swing
        let mut input = quiet_input(0, -300, Side::White);
        input.cpl = Some(300);
        assert_eq!(classify(&input, &book).category, MoveCategory::Blunder);

        // Same swing for Black is a gain
        let mut input = quiet_input(0, -300, Side::Black);
        input.cpl = Some(0);
        assert_eq!(base_tier(&input), MoveCategory::Excellent);

        let mut input = quiet_input(0, -60, Side::White);
        input.cpl = Some(60);
        assert_eq!(base_tier(&input), MoveCategory::Inaccuracy);
    }

    #[test]
    fn test_base_tier_falls_back_to_cpl() {
        let mut input = quiet_input(0, 0, Side::White);
        input.cp_after_white = None;
        input.cpl = Some(150);
        assert_eq!(base_tier(&input), MoveCategory::Mistake);
        input.cpl = None;
        assert_eq!(base_tier(&input), MoveCategory::Good);
    }

    #[test]
    fn test_best_move_without_triggers_is_best() {
        let mut input = quiet_input(30, 30, Side::White);
        input.is_best_move = true;
        let result = classify(&input, &OpeningBook::empty());
        assert_eq!(result.category, MoveCategory::Best);
        assert!(!result.book);
    }

    #[test]
    fn test_non_best_move_stays_at_base() {
        let mut input = quiet_input(30, 25, Side::White);
        input.cpl = Some(5);
        assert_eq!(
            classify(&input, &OpeningBook::empty()).category,
            MoveCategory::Excellent
        );
    }

    #[test]
    fn test_missed_mate_is_miss() {
        let mut input = quiet_input(0, 0, Side::White);
        input.mate_before = Some(2);
        input.cp_before_white = None;
        input.missed_mate = true;
        let result = classify(&input, &OpeningBook::empty());
        assert_eq!(result.category, MoveCategory::Miss);
        assert!(result.missed_mate);
    }

    #[test]
    fn test_book_overrides_everything() {
        let mut input = quiet_input(0, -900, Side::White);
        input.cpl = Some(900);
        let book = OpeningBook::from_placements([input.fen_after]);
        let result = classify(&input, &book);
        assert_eq!(result.category, MoveCategory::Book);
        assert_eq!(result.underlying, MoveCategory::Blunder);
        assert!(result.book);

        input.missed_mate = true;
        assert_eq!(classify(&input, &book).category, MoveCategory::Book);
    }

    #[test]
    fn test_turnaround_is_great() {
        // Black to move at -0.80 for Black turns it into +0.80 for Black
        let mut input = quiet_input(80, -80, Side::Black);
        input.is_best_move = true;
        let result = classify(&input, &OpeningBook::empty());
        assert_eq!(result.category, MoveCategory::Great);
    }

    #[test]
    fn test_only_move_is_great() {
        let mut input = quiet_input(100, 100, Side::White);
        input.is_best_move = true;
        input.alternative_line_win_pct = Some(win_percentage(Some(-200), None));
        assert_eq!(
            classify(&input, &OpeningBook::empty()).category,
            MoveCategory::Great
        );
    }

    #[test]
    fn test_simple_recapture_is_not_great() {
        let mut input = quiet_input(100, 100, Side::White);
        input.is_best_move = true;
        input.alternative_line_win_pct = Some(win_percentage(Some(-200), None));
        input.fen_two_plies_ago = Some(SCOTCH_EXD4);
        input.uci_moves_two_ago = Some(["f3d4", "c6d4"]);
        assert_eq!(
            classify(&input, &OpeningBook::empty()).category,
            MoveCategory::Best
        );
    }

    #[test]
    fn test_losing_mover_is_never_great() {
        let mut input = quiet_input(-300, -300, Side::White);
        input.is_best_move = true;
        input.alternative_line_win_pct = Some(win_percentage(Some(-900), None));
        assert_eq!(
            classify(&input, &OpeningBook::empty()).category,
            MoveCategory::Best
        );
    }

    fn bishop_sacrifice_input(pv: &[String]) -> ClassificationInput<'_> {
        let mut input = quiet_input(50, 60, Side::White);
        input.fen_before = ITALIAN;
        input.fen_after = AFTER_BXF7;
        input.move_uci = "c4f7";
        input.best_line_pv = pv;
        input.is_best_move = true;
        input.alternative_line_win_pct = Some(win_percentage(Some(40), None));
        input
    }

    #[test]
    fn test_sound_sacrifice_is_brilliant() {
        let pv: Vec<String> = ["e8f7", "f3g5", "f7g8"].iter().map(|s| s.to_string()).collect();
        let input = bishop_sacrifice_input(&pv);
        assert_eq!(
            classify(&input, &OpeningBook::empty()).category,
            MoveCategory::Brilliant
        );
    }

    #[test]
    fn test_sacrifice_without_alternative_is_not_brilliant() {
        let pv: Vec<String> = ["e8f7", "f3g5", "f7g8"].iter().map(|s| s.to_string()).collect();
        let mut input = bishop_sacrifice_input(&pv);
        input.alternative_line_win_pct = None;
        assert_eq!(
            classify(&input, &OpeningBook::empty()).category,
            MoveCategory::Best
        );
    }

    #[test]
    fn test_sacrifice_against_decisive_alternative_is_not_brilliant() {
        let pv: Vec<String> = ["e8f7", "f3g5", "f7g8"].iter().map(|s| s.to_string()).collect();
        let mut input = bishop_sacrifice_input(&pv);
        input.alternative_line_win_pct = Some(1.0);
        assert_ne!(
            classify(&input, &OpeningBook::empty()).category,
            MoveCategory::Brilliant
        );
    }

    #[test]
    fn test_every_result_is_a_known_category() {
        let book = OpeningBook::empty();
        for cp_after in (-1200..=1200).step_by(100) {
            for side in [Side::White, Side::Black] {
                let input = quiet_input(0, cp_after, side);
                let result = classify(&input, &book);
                assert!(MoveCategory::ALL.contains(&result.category));
            }
        }
    }
}
