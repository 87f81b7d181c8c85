use cozy_chess::{Board, Color, Piece};

/// Conventional piece values in pawns; the king carries no material.
pub fn material_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 1,
        Piece::Knight => 3,
        Piece::Bishop => 3,
        Piece::Rook => 5,
        Piece::Queen => 9,
        Piece::King => 0,
    }
}

/// Total material of one color.
pub fn material_of(board: &Board, color: Color) -> i32 {
    Piece::ALL
        .iter()
        .map(|&piece| board.colored_pieces(color, piece).len() as i32 * material_value(piece))
        .sum()
}

/// White material minus Black material.
pub fn material_balance(board: &Board) -> i32 {
    material_of(board, Color::White) - material_of(board, Color::Black)
}
