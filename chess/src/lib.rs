//! Board-level helpers for the review workspace: FEN and UCI handling,
//! move-list replay with SAN, material counting, and the engine analysis
//! types every other crate exchanges. Rules come from `cozy-chess`.

pub mod analysis;
pub mod fen;
pub mod game;
pub mod material;
pub mod uci;

pub use analysis::{EngineLine, PositionAnalysis, Score};
pub use fen::{board_placement, format_fen, parse_fen, FenError, STARTING_FEN};
pub use game::{captured_piece, format_san, replay, Replay, ReplayError, ReplayedMove};
pub use material::{material_balance, material_of, material_value};
pub use uci::{
    convert_uci_castling_to_cozy, format_standard_uci, format_uci_move, parse_uci_move,
    resolve_uci_move, UciMoveError,
};

pub use cozy_chess::{Board, Color, Move, Piece};
