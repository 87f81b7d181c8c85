//! Tactical heuristics consulted by the move classifier.

use chess::{
    captured_piece, material_balance, parse_fen, parse_uci_move, resolve_uci_move, Color, Piece,
};

use crate::book::OpeningBook;

/// Consecutive quiet moves after which a sacrifice line stops being replayed.
const QUIET_MOVE_LIMIT: u8 = 2;

/// True when `moves[1]` lands on the square `moves[0]` just moved to and a
/// piece is standing there, i.e. an immediate recapture.
///
/// Anything unparseable or unplayable is not a recapture.
pub fn is_simple_recapture(fen_two_plies_ago: &str, moves: [&str; 2]) -> bool {
    let (Ok(first), Ok(second)) = (parse_uci_move(moves[0]), parse_uci_move(moves[1])) else {
        return false;
    };
    if first.to != second.to {
        return false;
    }

    let Ok(mut board) = parse_fen(fen_two_plies_ago) else {
        return false;
    };
    let Ok(mv) = resolve_uci_move(&board, moves[0]) else {
        return false;
    };
    board.play_unchecked(mv);

    board.piece_on(first.to).is_some()
}

/// Pieces captured by each color during a replayed line.
///
/// Immutable: every capture yields a new tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureTally {
    by_white: [u8; 6],
    by_black: [u8; 6],
}

impl CaptureTally {
    pub fn with_capture(self, capturer: Color, piece: Piece) -> Self {
        let mut next = self;
        let counts = match capturer {
            Color::White => &mut next.by_white,
            Color::Black => &mut next.by_black,
        };
        counts[piece as usize] = counts[piece as usize].saturating_add(1);
        next
    }

    /// Remove even exchanges: for each piece type both colors captured, drop
    /// the common count from both.
    pub fn cancel_exchanges(self) -> Self {
        let mut next = self;
        for i in 0..6 {
            let common = next.by_white[i].min(next.by_black[i]);
            next.by_white[i] -= common;
            next.by_black[i] -= common;
        }
        next
    }

    pub fn captured(&self, capturer: Color, piece: Piece) -> u8 {
        match capturer {
            Color::White => self.by_white[piece as usize],
            Color::Black => self.by_black[piece as usize],
        }
    }

    /// True when nothing but pawns has been captured.
    pub fn only_pawns(&self) -> bool {
        Piece::ALL
            .iter()
            .filter(|&&p| p != Piece::Pawn)
            .all(|&p| self.captured(Color::White, p) == 0 && self.captured(Color::Black, p) == 0)
    }

    pub fn pawn_difference(&self) -> u8 {
        self.captured(Color::White, Piece::Pawn)
            .abs_diff(self.captured(Color::Black, Piece::Pawn))
    }
}

/// Whether playing `played` and then following `continuation` leaves the
/// mover materially worse off in a way that is not just an even trade.
///
/// Only whole move pairs are replayed, and the replay stops after the second
/// consecutive non-capturing move. Any replay failure yields `false`.
pub fn is_piece_sacrifice(fen_before: &str, played: &str, continuation: &[String]) -> bool {
    let mut sequence: Vec<&str> = std::iter::once(played)
        .chain(continuation.iter().map(String::as_str))
        .collect();
    if sequence.len() % 2 == 1 {
        sequence.pop();
    }

    let Ok(mut board) = parse_fen(fen_before) else {
        return false;
    };
    let mover = board.side_to_move();
    let start_balance = material_balance(&board);

    let mut tally = CaptureTally::default();
    let mut quiet_run = 0u8;

    for uci in sequence {
        let Ok(mv) = resolve_uci_move(&board, uci) else {
            return false;
        };
        match captured_piece(&board, mv) {
            Some(piece) => {
                tally = tally.with_capture(board.side_to_move(), piece);
                quiet_run = 0;
            }
            None => quiet_run += 1,
        }
        board.play_unchecked(mv);

        if quiet_run >= QUIET_MOVE_LIMIT {
            break;
        }
    }

    let remaining = tally.cancel_exchanges();
    if remaining.only_pawns() && remaining.pawn_difference() <= 1 {
        return false;
    }

    let delta = material_balance(&board) - start_balance;
    let mover_delta = match mover {
        Color::White => delta,
        Color::Black => -delta,
    };
    mover_delta < 0
}

/// Whether the position's placement is known opening theory.
pub fn is_book_move(fen: &str, book: &OpeningBook) -> bool {
    book.contains_fen(fen)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITALIAN: &str = "r1bqk1nr/pppp1ppp/2n5/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";
    const SCOTCH_EXD4: &str = "r1bqkbnr/pppp1ppp/2n5/8/3pP3/5N2/PPP2PPP/RNBQKB1R w KQkq - 0 4";
    const SCOTCH_NXD4: &str = "r1bqkbnr/pppp1ppp/2n5/8/3NP3/8/PPP2PPP/RNBQKB1R b KQkq - 0 4";
    const SCANDINAVIAN: &str = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";

    fn line(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_simple_recapture_same_square() {
        assert!(is_simple_recapture(SCOTCH_EXD4, ["f3d4", "c6d4"]));
    }

    #[test]
    fn test_simple_recapture_different_square() {
        assert!(!is_simple_recapture(SCOTCH_EXD4, ["f3d4", "g8f6"]));
    }

    #[test]
    fn test_simple_recapture_garbage() {
        assert!(!is_simple_recapture("not a fen", ["f3d4", "c6d4"]));
        assert!(!is_simple_recapture(SCOTCH_EXD4, ["zz", "c6d4"]));
        // First move is illegal in the position
        assert!(!is_simple_recapture(SCOTCH_EXD4, ["a1d4", "c6d4"]));
    }

    #[test]
    fn test_bishop_sacrifice_on_f7() {
        // Bxf7+ Kxf7 Ng5+ Kg8: bishop for a pawn
        assert!(is_piece_sacrifice(
            ITALIAN,
            "c4f7",
            &line(&["e8f7", "f3g5", "f7g8"])
        ));
    }

    #[test]
    fn test_even_knight_trade_is_not_sacrifice() {
        assert!(!is_piece_sacrifice(SCOTCH_NXD4, "c6d4", &line(&["d1d4"])));
    }

    #[test]
    fn test_pawn_trade_is_not_sacrifice() {
        assert!(!is_piece_sacrifice(SCANDINAVIAN, "e4d5", &line(&["d8d5"])));
    }

    #[test]
    fn test_quiet_line_is_not_sacrifice() {
        assert!(!is_piece_sacrifice(ITALIAN, "e1h1", &line(&["g8f6", "d2d3"])));
    }

    #[test]
    fn test_black_knight_sacrifice() {
        // ...Nxe4 Nxe4: knight for a pawn, scored from Black's side
        let four_knights = "r1bqkb1r/pppp1ppp/2n2n2/4p3/4P3/2N2N2/PPPP1PPP/R1BQKB1R b KQkq - 5 4";
        assert!(is_piece_sacrifice(four_knights, "f6e4", &line(&["c3e4"])));
    }

    #[test]
    fn test_captures_after_two_quiet_moves_are_ignored() {
        let fen = "3rk3/8/8/3p4/8/8/8/3QK3 w - - 0 1";
        // Qxd5 Rxd5 on its own loses the queen
        assert!(is_piece_sacrifice(fen, "d1d5", &line(&["d8d5"])));
        // Two quiet moves end the replay before the same exchange
        assert!(!is_piece_sacrifice(
            fen,
            "e1e2",
            &line(&["e8e7", "d1d5", "d8d5"])
        ));
    }

    #[test]
    fn test_odd_length_drops_last_move() {
        // A lone capture without a reply is never replayed
        assert!(!is_piece_sacrifice(ITALIAN, "c4f7", &[]));
    }

    #[test]
    fn test_illegal_line_is_not_sacrifice() {
        assert!(!is_piece_sacrifice(ITALIAN, "c4f7", &line(&["e2e4"])));
        assert!(!is_piece_sacrifice("garbage", "c4f7", &line(&["e8f7"])));
    }

    #[test]
    fn test_capture_tally_is_immutable() {
        let empty = CaptureTally::default();
        let one = empty.with_capture(Color::White, Piece::Knight);
        assert_eq!(empty.captured(Color::White, Piece::Knight), 0);
        assert_eq!(one.captured(Color::White, Piece::Knight), 1);
    }

    #[test]
    fn test_capture_tally_cancels_exchanges() {
        let tally = CaptureTally::default()
            .with_capture(Color::White, Piece::Knight)
            .with_capture(Color::Black, Piece::Knight)
            .with_capture(Color::White, Piece::Pawn)
            .with_capture(Color::White, Piece::Pawn)
            .with_capture(Color::Black, Piece::Pawn)
            .cancel_exchanges();
        assert!(tally.only_pawns());
        assert_eq!(tally.pawn_difference(), 1);
        assert_eq!(tally.captured(Color::White, Piece::Pawn), 1);
        assert_eq!(tally.captured(Color::Black, Piece::Pawn), 0);
    }

    #[test]
    fn test_is_book_move_matches_placement_only() {
        let book = OpeningBook::from_placements([
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR",
        ]);
        assert!(is_book_move(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
            &book
        ));
        assert!(!is_book_move(chess::STARTING_FEN, &book));
    }
}
