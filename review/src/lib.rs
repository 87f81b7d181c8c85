//! Game review: classifies every move of a game against engine analysis
//! and summarises accuracy for both sides.
//!
//! The engine itself sits behind [`EvaluationProvider`]; [`GameReviewer`]
//! drives one batched evaluation per game and folds the results through
//! the move classifier.

pub mod book;
pub mod classifier;
pub mod error;
pub mod heuristics;
pub mod orchestrator;
pub mod provider;
pub mod summary;
pub mod types;
pub mod win;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use book::{BookError, OpeningBook};
pub use classifier::{classify, Classification, ClassificationInput};
pub use error::{ProviderError, ReviewError, ReviewResult};
pub use heuristics::{is_book_move, is_piece_sacrifice, is_simple_recapture};
pub use orchestrator::GameReviewer;
pub use provider::{EvaluateGameRequest, EvaluationProvider, ProgressCallback};
pub use summary::accuracy_from_acpl;
pub use types::*;
pub use win::{mover_relative, win_percentage, ScoreWinExt};

pub use chess::{EngineLine, PositionAnalysis, Score};
