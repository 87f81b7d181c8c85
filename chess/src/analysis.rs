//! Engine analysis types shared by the review core and the engine pool.

use serde::{Deserialize, Serialize};

/// Engine evaluation score, always from White's point of view.
///
/// Centipawns: positive = White is better.
/// Mate: signed ply count to mate, positive = White mates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Score {
    #[serde(rename = "cp")]
    Centipawns(i32),
    Mate(i32),
}

impl Score {
    /// Build a White-relative score from a side-to-move-relative engine score.
    pub fn from_side_to_move(score: Score, white_to_move: bool) -> Self {
        if white_to_move {
            score
        } else {
            score.negate()
        }
    }

    pub fn cp(&self) -> Option<i32> {
        match self {
            Self::Centipawns(cp) => Some(*cp),
            Self::Mate(_) => None,
        }
    }

    pub fn mate(&self) -> Option<i32> {
        match self {
            Self::Centipawns(_) => None,
            Self::Mate(m) => Some(*m),
        }
    }

    /// Centipawn value with a mate replaced by `±mate_cp` toward the mating side.
    pub fn to_cp_with_mate(&self, mate_cp: i32) -> i32 {
        match self {
            Self::Centipawns(cp) => *cp,
            Self::Mate(m) if *m > 0 => mate_cp,
            Self::Mate(m) if *m < 0 => -mate_cp,
            Self::Mate(_) => 0,
        }
    }

    /// Negate the score (flip perspective).
    pub fn negate(&self) -> Self {
        match self {
            Self::Centipawns(cp) => Self::Centipawns(-cp),
            Self::Mate(m) => Self::Mate(-m),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Centipawns(cp) => format!("{:+.2}", *cp as f64 / 100.0),
            Self::Mate(m) => {
                if *m >= 0 {
                    format!("+M{}", m)
                } else {
                    format!("-M{}", m.abs())
                }
            }
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// One ranked line reported by a MultiPV search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineLine {
    /// 1 = the engine's preferred line.
    pub rank: u32,
    pub score: Score,
    /// Principal variation as UCI move strings.
    pub pv: Vec<String>,
}

impl EngineLine {
    pub fn new(rank: u32, score: Score, pv: Vec<String>) -> Self {
        Self { rank, score, pv }
    }

    /// First move of the principal variation.
    pub fn first_move(&self) -> Option<&str> {
        self.pv.first().map(String::as_str)
    }

    /// Whether the line starts with `uci` (case-insensitive).
    pub fn starts_with(&self, uci: &str) -> bool {
        self.first_move()
            .is_some_and(|m| m.eq_ignore_ascii_case(uci.trim()))
    }
}

/// All lines reported for one position, rank ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionAnalysis {
    pub lines: Vec<EngineLine>,
}

impl PositionAnalysis {
    /// Build from lines in any order; they are sorted by rank.
    pub fn new(mut lines: Vec<EngineLine>) -> Self {
        lines.sort_by_key(|l| l.rank);
        Self { lines }
    }

    pub fn best_line(&self) -> Option<&EngineLine> {
        self.lines.first()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
