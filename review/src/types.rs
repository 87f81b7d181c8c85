use std::collections::BTreeMap;
use std::fmt;

use chess::{replay, Color, EngineLine, ReplayError, Score};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DEPTH: u32 = 14;
pub const DEFAULT_MULTI_PV: u32 = 3;
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Which player made a move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    White,
    Black,
}

impl Side {
    pub fn is_white(self) -> bool {
        self == Side::White
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality tier assigned to a reviewed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCategory {
    /// A sound piece sacrifice that keeps the position.
    Brilliant,
    /// The only good move, or one that turns the game around.
    Great,
    /// The engine's top choice.
    Best,
    Excellent,
    Good,
    /// Known opening theory.
    Book,
    Inaccuracy,
    Mistake,
    /// A forced mate was available and not played.
    Miss,
    Blunder,
}

impl MoveCategory {
    pub const ALL: [MoveCategory; 10] = [
        MoveCategory::Brilliant,
        MoveCategory::Great,
        MoveCategory::Best,
        MoveCategory::Excellent,
        MoveCategory::Good,
        MoveCategory::Book,
        MoveCategory::Inaccuracy,
        MoveCategory::Mistake,
        MoveCategory::Miss,
        MoveCategory::Blunder,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Brilliant => "brilliant",
            Self::Great => "great",
            Self::Best => "best",
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Book => "book",
            Self::Inaccuracy => "inaccuracy",
            Self::Mistake => "mistake",
            Self::Miss => "miss",
            Self::Blunder => "blunder",
        }
    }

    /// NAG (Numeric Annotation Glyph) for PGN export.
    pub fn to_nag(self) -> Option<u8> {
        match self {
            Self::Brilliant => Some(3), // !!
            Self::Great => Some(1), // !
            Self::Inaccuracy => Some(6), // ?!
            Self::Mistake | Self::Miss => Some(2), // ?
            Self::Blunder => Some(4), // ??
            Self::Best | Self::Excellent | Self::Good | Self::Book => None,
        }
    }

    /// Move-list suffix matching the NAG.
    pub fn symbol(self) -> &'static str {
        match self.to_nag() {
            Some(3) => "!!",
            Some(1) => "!",
            Some(6) => "?!",
            Some(2) => "?",
            Some(4) => "??",
            _ => "",
        }
    }
}

impl fmt::Display for MoveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A move as it appears in the game being reviewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedMove {
    /// 1-based half-move number.
    pub ply: u32,
    pub side: Side,
    pub uci: String,
    pub san: String,
}

/// The game handed to the reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHistory {
    pub start_fen: String,
    pub moves: Vec<PlayedMove>,
}

impl GameHistory {
    /// Build a history from UCI moves, filling in ply, side and SAN by
    /// replaying them from `start_fen`.
    pub fn from_uci<S: AsRef<str>>(start_fen: &str, uci_moves: &[S]) -> Result<Self, ReplayError> {
        let replayed = replay(start_fen, uci_moves)?;
        let moves = replayed
            .moves
            .into_iter()
            .enumerate()
            .map(|(i, m)| PlayedMove {
                ply: i as u32 + 1,
                side: m.color.into(),
                uci: m.uci,
                san: m.san,
            })
            .collect();

        Ok(Self {
            start_fen: replayed.start_fen,
            moves,
        })
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Review result for one ply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub ply: u32,
    pub side: Side,
    pub fen_before: String,
    pub fen_after: String,
    pub uci: String,
    pub san: String,
    /// Engine's preferred line in the position before the move.
    pub best: EngineLine,
    /// Up to two runner-up lines.
    pub alt_lines: Vec<EngineLine>,
    /// Evaluation after the move (White's perspective), if the position
    /// after it was analysed.
    pub score_after: Option<Score>,
    /// Centipawn loss; `None` when the after-position is unknown.
    pub cpl: Option<i32>,
    pub category: MoveCategory,
    /// Category before the opening-book override.
    pub underlying_category: MoveCategory,
    pub missed_mate: bool,
    pub book: bool,
}

/// Aggregate statistics for one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSummary {
    pub acpl: f64,
    pub accuracy: f64,
    pub counts: BTreeMap<MoveCategory, u32>,
    pub book_moves: u32,
    pub moves: u32,
}

impl SideSummary {
    pub fn count(&self, category: MoveCategory) -> u32 {
        self.counts.get(&category).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub white: SideSummary,
    pub black: SideSummary,
}

impl ReviewSummary {
    pub fn side(&self, side: Side) -> &SideSummary {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }
}

/// Full review of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReview {
    pub moves: Vec<MoveRecord>,
    pub summary: ReviewSummary,
}

/// Estimated progress of a running review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewProgress {
    /// Estimated number of moves analysed so far.
    pub current: u32,
    pub total: u32,
    pub percentage: u8,
}

/// Engine settings for one review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOptions {
    pub depth: u32,
    pub multi_pv: u32,
    pub worker_count: usize,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            multi_pv: DEFAULT_MULTI_PV,
            worker_count: DEFAULT_WORKER_COUNT,
        }
    }
}
