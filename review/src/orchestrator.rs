//! Drives the review of a whole game.
//!
//! Pipeline:
//!   1. Cancel whatever the provider is still doing
//!   2. Replay the history into N+1 positions
//!   3. One batched engine evaluation of every position
//!   4. Classify each ply whose before-position was analysed
//!   5. Per-side summaries

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use chess::{replay, EngineLine, PositionAnalysis, Replay, ReplayedMove, Score};

use crate::book::OpeningBook;
use crate::classifier::{classify, ClassificationInput};
use crate::error::{ReviewError, ReviewResult};
use crate::provider::{EvaluateGameRequest, EvaluationProvider, ProgressCallback};
use crate::summary::summarize;
use crate::types::{GameHistory, GameReview, MoveRecord, ReviewOptions, ReviewProgress, Side};
use crate::win::{mover_relative, ScoreWinExt};

/// Centipawn stand-in for a forced mate when measuring loss.
const MATE_CP: i32 = 1000;
/// Divisor used to turn provider percentages into an analysed-move estimate.
const PROGRESS_DIVISOR: f64 = 99.0;

/// Reviews games against an injected evaluation provider.
///
/// A provider serves one review at a time; every review starts by stopping
/// whatever the provider was doing.
pub struct GameReviewer<P> {
    provider: P,
    book: OpeningBook,
}

impl<P: EvaluationProvider> GameReviewer<P> {
    pub fn new(provider: P, book: OpeningBook) -> Self {
        Self { provider, book }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn book(&self) -> &OpeningBook {
        &self.book
    }

    /// Live analysis of a single position.
    pub async fn evaluate_position(&self, fen: &str, depth: u32) -> ReviewResult<PositionAnalysis> {
        chess::parse_fen(fen).map_err(|e| ReviewError::InvalidInput(e.to_string()))?;
        Ok(self.provider.evaluate_position(fen, depth).await?)
    }

    /// Review a whole game, reporting progress through `on_progress`.
    pub async fn review<F>(
        &self,
        history: &GameHistory,
        options: &ReviewOptions,
        on_progress: F,
    ) -> ReviewResult<GameReview>
    where
        F: Fn(ReviewProgress) + Send + Sync + 'static,
    {
        self.provider.stop_all_current_jobs().await;

        let replayed = replay_history(history)?;
        let total = replayed.moves.len();
        let fens = replayed.fens();

        tracing::info!(
            plies = total,
            depth = options.depth,
            multi_pv = options.multi_pv,
            workers = options.worker_count,
            "Starting game review"
        );

        let request = EvaluateGameRequest {
            fens,
            uci_moves: replayed.moves.iter().map(|m| m.uci.clone()).collect(),
            depth: options.depth,
            multi_pv: options.multi_pv,
            worker_count: options.worker_count,
        };
        let positions = self
            .provider
            .evaluate_game(request, progress_mapper(total as u32, on_progress))
            .await;

        let analysed = positions.iter().filter(|p| p.is_some()).count();
        if total > 0 && analysed == 0 {
            tracing::error!(plies = total, "Evaluator returned no positions");
            return Err(ReviewError::ReviewFailed(format!(
                "evaluator returned no positions for a {total}-ply game"
            )));
        }
        if analysed < total + 1 {
            tracing::warn!(
                expected = total + 1,
                analysed,
                "Evaluation incomplete, affected plies will be skipped"
            );
        }

        let moves = self.classify_moves(&replayed, &positions);
        let summary = summarize(&moves);

        tracing::info!(
            reviewed = moves.len(),
            plies = total,
            white_accuracy = summary.white.accuracy,
            black_accuracy = summary.black.accuracy,
            "Game review complete"
        );

        Ok(GameReview { moves, summary })
    }

    fn classify_moves(
        &self,
        replayed: &Replay,
        positions: &[Option<PositionAnalysis>],
    ) -> Vec<MoveRecord> {
        let mut records = Vec::with_capacity(replayed.moves.len());

        for (i, played) in replayed.moves.iter().enumerate() {
            let ply = i as u32 + 1;
            let Some((before, best)) = position_at(positions, i) else {
                tracing::warn!(ply, san = %played.san, "No analysis before move, skipping ply");
                continue;
            };
            let after = position_at(positions, i + 1).map(|(_, line)| line);
            if after.is_none() {
                tracing::warn!(ply, san = %played.san, "No analysis after move");
            }

            let previous = i.checked_sub(1).and_then(|j| replayed.moves.get(j));
            let record = self.classify_ply(ply, played, previous, before, best, after);

            tracing::debug!(
                ply,
                side = %record.side,
                san = %record.san,
                best = record.best.first_move().unwrap_or("-"),
                cpl = ?record.cpl,
                category = %record.category,
                "Ply classified"
            );
            records.push(record);
        }

        records
    }

    fn classify_ply(
        &self,
        ply: u32,
        played: &ReplayedMove,
        previous: Option<&ReplayedMove>,
        before: &PositionAnalysis,
        best: &EngineLine,
        after_line: Option<&EngineLine>,
    ) -> MoveRecord {
        let side = Side::from(played.color);
        let is_best_move = best.starts_with(&played.uci);
        let score_after = after_line.map(|l| l.score);

        let cpl = if is_best_move {
            Some(0)
        } else {
            score_after.map(|after| centipawn_loss(best.score, after, side))
        };
        let missed_mate = best.score.mate().is_some_and(|m| m != 0) && !is_best_move;

        let win_before = best.score.determinable_win();
        let win_after = score_after.and_then(|s| s.determinable_win());
        let win_percentage_diff = win_before
            .zip(win_after)
            .map(|(b, a)| mover_relative(a, side) - mover_relative(b, side));

        let alternative = before
            .lines
            .iter()
            .find(|l| l.first_move().is_some() && !l.starts_with(&played.uci));
        let alternative_line_win_pct = alternative.and_then(|l| l.score.determinable_win());

        let continuation: Vec<String> = match after_line {
            Some(line) => line.pv.clone(),
            None if is_best_move => best.pv.iter().skip(1).cloned().collect(),
            None => Vec::new(),
        };

        let classification = classify(
            &ClassificationInput {
                cpl,
                cp_before_white: best.score.cp(),
                cp_after_white: score_after.and_then(|s| s.cp()),
                mate_before: best.score.mate(),
                mate_after: score_after.and_then(|s| s.mate()),
                side,
                missed_mate,
                alternative_line_win_pct,
                win_percentage_diff,
                fen_before: &played.fen_before,
                fen_after: &played.fen_after,
                move_uci: &played.uci,
                best_line_pv: &continuation,
                fen_two_plies_ago: previous.map(|m| m.fen_before.as_str()),
                uci_moves_two_ago: previous.map(|m| [m.uci.as_str(), played.uci.as_str()]),
                is_best_move,
            },
            &self.book,
        );

        MoveRecord {
            ply,
            side,
            fen_before: played.fen_before.clone(),
            fen_after: played.fen_after.clone(),
            uci: played.uci.clone(),
            san: played.san.clone(),
            best: best.clone(),
            alt_lines: before.lines.iter().skip(1).take(2).cloned().collect(),
            score_after,
            cpl,
            category: classification.category,
            underlying_category: classification.underlying,
            missed_mate: classification.missed_mate,
            book: classification.book,
        }
    }
}

/// Replay the history, checking it agrees with the moves actually played.
fn replay_history(history: &GameHistory) -> ReviewResult<Replay> {
    let uci: Vec<&str> = history.moves.iter().map(|m| m.uci.as_str()).collect();
    let replayed =
        replay(&history.start_fen, &uci).map_err(|e| ReviewError::InvalidInput(e.to_string()))?;

    for (i, (given, actual)) in history.moves.iter().zip(&replayed.moves).enumerate() {
        let expected_ply = i as u32 + 1;
        if given.ply != expected_ply {
            return Err(ReviewError::InvalidInput(format!(
                "move {} ({}) has ply {}, expected {expected_ply}",
                i + 1,
                given.uci,
                given.ply
            )));
        }
        let actual_side = Side::from(actual.color);
        if given.side != actual_side {
            return Err(ReviewError::InvalidInput(format!(
                "ply {} ({}) is marked {}, but {actual_side} is to move",
                given.ply, given.uci, given.side
            )));
        }
    }

    Ok(replayed)
}

/// Analysis at `index` and its best line, if the position was analysed.
fn position_at(
    positions: &[Option<PositionAnalysis>],
    index: usize,
) -> Option<(&PositionAnalysis, &EngineLine)> {
    let analysis = positions.get(index)?.as_ref()?;
    Some((analysis, analysis.best_line()?))
}

/// Mover-relative loss between the best line and the played move, with
/// mates counted as ±1000.
fn centipawn_loss(before: Score, after: Score, side: Side) -> i32 {
    let sign = if side.is_white() { 1 } else { -1 };
    let before = before.to_cp_with_mate(MATE_CP) * sign;
    let after = after.to_cp_with_mate(MATE_CP) * sign;
    (before - after).max(0)
}

/// Wrap the caller's progress handler so it sees monotonic
/// [`ReviewProgress`] values.
fn progress_mapper<F>(total: u32, on_progress: F) -> ProgressCallback
where
    F: Fn(ReviewProgress) + Send + Sync + 'static,
{
    let last = AtomicU8::new(0);
    Arc::new(move |pct: u8| {
        let pct = pct.min(100);
        let percentage = last.fetch_max(pct, Ordering::SeqCst).max(pct);
        let current = ((f64::from(percentage) / PROGRESS_DIVISOR) * f64::from(total)).floor() as u32;
        let progress = ReviewProgress {
            current: current.min(total),
            total,
            percentage,
        };
        tracing::debug!(
            current = progress.current,
            total,
            percentage,
            "Review progress"
        );
        on_progress(progress);
    })
}
