use cozy_chess::{Board, Color, GameStatus, Move, Piece};

use crate::fen::{format_fen, parse_fen, FenError};
use crate::uci::{format_standard_uci, piece_letter, resolve_uci_move, UciMoveError};

/// One move of a replayed game, with the positions around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedMove {
    /// Standard UCI (castling as the two-square king move).
    pub uci: String,
    pub san: String,
    pub color: Color,
    pub fen_before: String,
    pub fen_after: String,
}

/// A move list replayed from a start position.
#[derive(Debug, Clone)]
pub struct Replay {
    pub start_fen: String,
    pub moves: Vec<ReplayedMove>,
}

impl Replay {
    /// Every visited position: the start position followed by the position
    /// after each move. Always `moves.len() + 1` entries.
    pub fn fens(&self) -> Vec<String> {
        std::iter::once(self.start_fen.clone())
            .chain(self.moves.iter().map(|m| m.fen_after.clone()))
            .collect()
    }
}

/// Replay UCI moves from `start_fen`, producing FENs and SAN for each ply.
pub fn replay<S: AsRef<str>>(start_fen: &str, uci_moves: &[S]) -> Result<Replay, ReplayError> {
    let mut board = parse_fen(start_fen)?;
    let start_fen = format_fen(&board);
    let mut moves = Vec::with_capacity(uci_moves.len());

    for (index, uci) in uci_moves.iter().enumerate() {
        let uci = uci.as_ref();
        let mv = resolve_uci_move(&board, uci).map_err(|source| ReplayError::Move {
            index,
            uci: uci.to_string(),
            source,
        })?;

        let fen_before = format_fen(&board);
        let san = format_san(&board, mv);
        let standard = format_standard_uci(&board, mv);
        let color = board.side_to_move();

        board.play_unchecked(mv);

        moves.push(ReplayedMove {
            uci: standard,
            san,
            color,
            fen_before,
            fen_after: format_fen(&board),
        });
    }

    Ok(Replay { start_fen, moves })
}

/// Piece captured by `mv` on `board`, including en passant. Castling is
/// never a capture even though cozy_chess encodes it as king-takes-rook.
pub fn captured_piece(board: &Board, mv: Move) -> Option<Piece> {
    let mover = board.side_to_move();
    match board.color_on(mv.to) {
        Some(color) if color != mover => board.piece_on(mv.to),
        Some(_) => None,
        None => {
            let is_en_passant = board.piece_on(mv.from) == Some(Piece::Pawn)
                && mv.from.file() != mv.to.file();
            is_en_passant.then_some(Piece::Pawn)
        }
    }
}

/// Format a legal move as Standard Algebraic Notation.
pub fn format_san(board: &Board, mv: Move) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        return format_standard_uci(board, mv);
    };

    let is_castle = piece == Piece::King && board.color_on(mv.to) == Some(board.side_to_move());
    let mut san = if is_castle {
        if mv.to.file() as u8 > mv.from.file() as u8 {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        }
    } else {
        let capture = captured_piece(board, mv).is_some();
        let mut san = String::new();

        if piece == Piece::Pawn {
            // Pawn captures include the file
            if capture {
                san.push(file_char(mv.from));
            }
        } else {
            san.push(piece_letter(piece));
            san.push_str(&disambiguation(board, mv, piece));
        }

        if capture {
            san.push('x');
        }
        san.push_str(&mv.to.to_string());

        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(piece_letter(promo));
        }
        san
    };

    let mut after = board.clone();
    after.play_unchecked(mv);
    if after.status() == GameStatus::Won {
        san.push('#');
    } else if !after.checkers().is_empty() {
        san.push('+');
    }

    san
}

/// File and/or rank needed to tell `mv` apart from other legal moves of the
/// same piece type landing on the same square.
fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let mut rivals = Vec::new();
    board.generate_moves(|moves| {
        if moves.piece == piece && moves.from != mv.from && moves.to.has(mv.to) {
            rivals.push(moves.from);
        }
        false
    });

    if rivals.is_empty() {
        return String::new();
    }

    let same_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let same_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());

    match (same_file, same_rank) {
        (false, _) => file_char(mv.from).to_string(),
        (true, false) => rank_char(mv.from).to_string(),
        (true, true) => mv.from.to_string(),
    }
}

fn file_char(square: cozy_chess::Square) -> char {
    (b'a' + square.file() as u8) as char
}

fn rank_char(square: cozy_chess::Square) -> char {
    (b'1' + square.rank() as u8) as char
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("FEN parse error: {0}")]
    Fen(#[from] FenError),
    #[error("Move {} ({uci}) cannot be played: {source}", index + 1)]
    Move {
        index: usize,
        uci: String,
        source: UciMoveError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::STARTING_FEN;

    fn san_of(fen: &str, uci: &str) -> String {
        let board = parse_fen(fen).unwrap();
        let mv = resolve_uci_move(&board, uci).unwrap();
        format_san(&board, mv)
    }

    #[test]
    fn test_replay_produces_one_more_fen_than_moves() {
        let replay = replay(STARTING_FEN, &["e2e4", "e7e5", "d1h5", "b8c6"]).unwrap();
        let fens = replay.fens();
        assert_eq!(fens.len(), 5);
        assert_eq!(fens[0], STARTING_FEN);
        assert_eq!(
            fens[4],
            "r1bqkbnr/pppp1ppp/2n5/4p2Q/4P3/8/PPPP1PPP/RNB1KBNR w KQkq - 2 3"
        );
        let sans: Vec<_> = replay.moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Qh5", "Nc6"]);
        assert_eq!(replay.moves[1].color, Color::Black);
    }

    #[test]
    fn test_replay_reports_failing_index() {
        let err = replay(STARTING_FEN, &["e2e4", "e2e4"]).unwrap_err();
        match err {
            ReplayError::Move { index, uci, .. } => {
                assert_eq!(index, 1);
                assert_eq!(uci, "e2e4");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_replay_empty_history() {
        let replay = replay::<&str>(STARTING_FEN, &[]).unwrap();
        assert!(replay.moves.is_empty());
        assert_eq!(replay.fens(), vec![STARTING_FEN.to_string()]);
    }

    #[test]
    fn test_replay_normalizes_castling() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let replay = replay(fen, &["e1h1"]).unwrap();
        assert_eq!(replay.moves[0].uci, "e1g1");
        assert_eq!(replay.moves[0].san, "O-O");
    }

    #[test]
    fn test_san_pawn_push_and_knight() {
        assert_eq!(san_of(STARTING_FEN, "e2e4"), "e4");
        assert_eq!(san_of(STARTING_FEN, "g1f3"), "Nf3");
    }

    #[test]
    fn test_san_capture() {
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";
        assert_eq!(san_of(fen, "e4d5"), "exd5");
    }

    #[test]
    fn test_san_en_passant() {
        let fen = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        assert_eq!(san_of(fen, "e5f6"), "exf6");
    }

    #[test]
    fn test_san_castling_queenside() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        assert_eq!(san_of(fen, "e1c1"), "O-O-O");
    }

    #[test]
    fn test_san_promotion() {
        let fen = "8/P7/8/8/8/8/8/4K2k w - - 0 1";
        assert_eq!(san_of(fen, "a7a8q"), "a8=Q");
    }

    #[test]
    fn test_san_check_and_mate() {
        // Fool's mate: 1.f3 e5 2.g4 Qh4#
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2";
        assert_eq!(san_of(fen, "d8h4"), "Qh4#");

        let fen = "4k3/8/8/8/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(fen, "a1a8"), "Ra8+");
    }

    #[test]
    fn test_san_disambiguation() {
        // Knights on b1 and f1 can both reach d2
        let fen = "4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1";
        assert_eq!(san_of(fen, "b1d2"), "Nbd2");
        // Rooks on a1 and a5 share a file
        let fen = "4k3/8/8/R7/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(fen, "a1a3"), "R1a3");
    }

    #[test]
    fn test_captured_piece_ignores_castling() {
        let board = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let castle = resolve_uci_move(&board, "e1g1").unwrap();
        assert_eq!(captured_piece(&board, castle), None);
    }
}
