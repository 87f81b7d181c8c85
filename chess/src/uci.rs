//! UCI (Universal Chess Interface) move utilities

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

/// Errors produced while reading a UCI move string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UciMoveError {
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
    #[error("Illegal move in position: {0}")]
    Illegal(String),
}

/// Parse UCI move format (e2e4, e7e8q) without consulting a position.
///
/// Promotion letters are accepted in either case.
pub fn parse_uci_move(s: &str) -> Result<Move, UciMoveError> {
    let s = s.trim();
    if !(s.len() == 4 || s.len() == 5) || !s.is_ascii() {
        return Err(UciMoveError::InvalidMove(s.to_string()));
    }

    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;

    let promotion = match s.get(4..5) {
        None => None,
        Some(p) => Some(match p.to_ascii_lowercase().as_str() {
            "q" => Piece::Queen,
            "r" => Piece::Rook,
            "b" => Piece::Bishop,
            "n" => Piece::Knight,
            _ => return Err(UciMoveError::InvalidPromotion(s.to_string())),
        }),
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

fn parse_square(s: &str) -> Result<Square, UciMoveError> {
    let mut chars = s.chars();
    let (Some(f), Some(r), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(UciMoveError::InvalidSquare(s.to_string()));
    };

    let file = match f.to_ascii_lowercase() {
        'a' => File::A,
        'b' => File::B,
        'c' => File::C,
        'd' => File::D,
        'e' => File::E,
        'f' => File::F,
        'g' => File::G,
        'h' => File::H,
        _ => return Err(UciMoveError::InvalidSquare(s.to_string())),
    };

    let rank = match r {
        '1' => Rank::First,
        '2' => Rank::Second,
        '3' => Rank::Third,
        '4' => Rank::Fourth,
        '5' => Rank::Fifth,
        '6' => Rank::Sixth,
        '7' => Rank::Seventh,
        '8' => Rank::Eighth,
        _ => return Err(UciMoveError::InvalidSquare(s.to_string())),
    };

    Ok(Square::new(file, rank))
}

/// Convert UCI castling notation to cozy_chess notation
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8
///
/// The conversion only happens when the king-to-rook move is legal on `board`;
/// anything else is returned unchanged.
pub fn convert_uci_castling_to_cozy(board: &Board, mv: Move) -> Move {
    let is_rank_1_or_8 = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);
    let is_g_or_c_file = matches!(mv.to.file(), File::G | File::C);

    if is_rank_1_or_8
        && is_e_file
        && is_g_or_c_file
        && mv.promotion.is_none()
        && mv.from.rank() == mv.to.rank()
        && board.piece_on(mv.from) == Some(Piece::King)
    {
        let rook_file = if mv.to.file() == File::G {
            File::H
        } else {
            File::A
        };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };

        if board.is_legal(converted) {
            return converted;
        }
    }

    mv
}

/// Resolve a UCI string against a position into a legal cozy_chess move.
///
/// Accepts both castling spellings (e1g1 and e1h1).
pub fn resolve_uci_move(board: &Board, s: &str) -> Result<Move, UciMoveError> {
    let parsed = parse_uci_move(s)?;
    let mv = convert_uci_castling_to_cozy(board, parsed);
    if board.is_legal(mv) {
        Ok(mv)
    } else {
        Err(UciMoveError::Illegal(s.trim().to_string()))
    }
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q")
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", mv.from, mv.to);
    if let Some(promo) = mv.promotion {
        s.push(piece_letter(promo).to_ascii_lowercase());
    }
    s
}

/// Format a legal move from `board` in standard UCI, turning cozy_chess
/// king-takes-rook castling back into the two-square king move.
pub fn format_standard_uci(board: &Board, mv: Move) -> String {
    let is_castle = board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move());
    if !is_castle {
        return format_uci_move(mv);
    }

    let king_file = if mv.to.file() as u8 > mv.from.file() as u8 {
        File::G
    } else {
        File::C
    };
    format_uci_move(Move {
        from: mv.from,
        to: Square::new(king_file, mv.from.rank()),
        promotion: None,
    })
}

/// Uppercase SAN letter for a piece.
pub fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::{parse_fen, STARTING_FEN};

    #[test]
    fn test_format_uci_move() {
        let mv = Move {
            from: Square::new(File::E, Rank::Second),
            to: Square::new(File::E, Rank::Fourth),
            promotion: None,
        };
        assert_eq!(format_uci_move(mv), "e2e4");
    }

    #[test]
    fn test_format_uci_move_with_promotion() {
        let mv = Move {
            from: Square::new(File::E, Rank::Seventh),
            to: Square::new(File::E, Rank::Eighth),
            promotion: Some(Piece::Queen),
        };
        assert_eq!(format_uci_move(mv), "e7e8q");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(parse_uci_move("e2"), Err(UciMoveError::InvalidMove(_))));
        assert!(matches!(parse_uci_move("i2e4"), Err(UciMoveError::InvalidSquare(_))));
        assert!(matches!(parse_uci_move("e7e8k"), Err(UciMoveError::InvalidPromotion(_))));
        assert!(matches!(parse_uci_move("e2e4e5"), Err(UciMoveError::InvalidMove(_))));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let mv = parse_uci_move("E7E8Q").unwrap();
        assert_eq!(format_uci_move(mv), "e7e8q");
    }

    #[test]
    fn test_resolve_castling_both_spellings() {
        let board = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let standard = resolve_uci_move(&board, "e1g1").unwrap();
        let cozy = resolve_uci_move(&board, "e1h1").unwrap();
        assert_eq!(standard, cozy);
        assert_eq!(format_standard_uci(&board, standard), "e1g1");

        let long = resolve_uci_move(&board, "e1c1").unwrap();
        assert_eq!(format_standard_uci(&board, long), "e1c1");
    }

    #[test]
    fn test_resolve_rejects_illegal() {
        let board = parse_fen(STARTING_FEN).unwrap();
        assert!(matches!(
            resolve_uci_move(&board, "e2e5"),
            Err(UciMoveError::Illegal(_))
        ));
        assert!(resolve_uci_move(&board, "g1f3").is_ok());
    }
}
