pub mod pool;
pub mod stockfish;
pub mod uci;

pub use pool::{terminal_analysis, EnginePool};
pub use stockfish::{find_stockfish_path, EngineConfig, EngineError, StockfishEngine};
pub use uci::{UciError, UciMessage};

use chess::Score;

/// Commands sent to the engine
#[derive(Debug, Clone)]
pub enum EngineCommand {
    SetPosition { fen: String },
    SetOption { name: String, value: Option<String> },
    /// Search to a fixed depth.
    Go { depth: u32 },
    Stop,
    Quit,
}

/// Events received from the engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Ready,
    /// `None` when the engine answered `bestmove (none)`.
    BestMove(Option<String>),
    Info(EngineInfo),
    Error(String),
}

/// The parts of an `info` line the review needs.
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub depth: Option<u32>,
    /// Relative to the side to move.
    pub score: Option<Score>,
    /// Set when the score is only a lowerbound or upperbound.
    pub bound: bool,
    pub pv: Vec<String>, // Principal variation, UCI notation
    pub multipv: Option<u32>,
}
