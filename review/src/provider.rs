//! Evaluation provider abstraction.
//!
//! Implemented by the Stockfish pool in the `engine` crate and by
//! [`crate::mock::MockEvaluationProvider`] in tests.

use std::sync::Arc;

use async_trait::async_trait;
use chess::PositionAnalysis;

use crate::error::ProviderError;

/// Receives evaluation progress as a percentage in [0, 100].
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// One batched evaluation of every position in a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluateGameRequest {
    /// Start position followed by the position after each move.
    pub fens: Vec<String>,
    pub uci_moves: Vec<String>,
    pub depth: u32,
    pub multi_pv: u32,
    pub worker_count: usize,
}

/// Source of engine evaluations for the reviewer.
#[async_trait]
pub trait EvaluationProvider: Send + Sync {
    fn is_ready(&self) -> bool;

    /// Analyse a single position.
    async fn evaluate_position(
        &self,
        fen: &str,
        depth: u32,
    ) -> Result<PositionAnalysis, ProviderError>;

    /// Analyse every position of a game.
    ///
    /// The result is index-aligned with `request.fens`. It may be shorter
    /// than the request, and `None` marks a position that could not be
    /// analysed.
    async fn evaluate_game(
        &self,
        request: EvaluateGameRequest,
        progress: ProgressCallback,
    ) -> Vec<Option<PositionAnalysis>>;

    /// Abandon any evaluation still in flight.
    async fn stop_all_current_jobs(&self);

    async fn shutdown(&self);
}
