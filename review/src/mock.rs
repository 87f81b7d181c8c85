//! Mock EvaluationProvider implementation for testing
//!
//! Only compiled in test mode or with the `mock` feature.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chess::{EngineLine, PositionAnalysis, Score};

use crate::error::ProviderError;
use crate::provider::{EvaluateGameRequest, EvaluationProvider, ProgressCallback};

type PositionResponse = Box<dyn Fn(&str, u32) -> Result<PositionAnalysis, ProviderError> + Send>;

/// Scripted provider with a call log.
pub struct MockEvaluationProvider {
    responses: Arc<Mutex<MockResponses>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Default)]
struct MockResponses {
    game: Option<Vec<Option<PositionAnalysis>>>,
    position: Option<PositionResponse>,
    progress_reports: Vec<u8>,
    ready: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    EvaluatePosition { fen: String, depth: u32 },
    EvaluateGame(EvaluateGameRequest),
    StopAllCurrentJobs,
    Shutdown,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for MockEvaluationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEvaluationProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(MockResponses {
                ready: true,
                ..Default::default()
            })),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Configure the evaluate_game result
    pub fn with_game_response(self, positions: Vec<Option<PositionAnalysis>>) -> Self {
        lock(&self.responses).game = Some(positions);
        self
    }

    /// Configure evaluate_position
    pub fn with_position_response<F>(self, f: F) -> Self
    where
        F: Fn(&str, u32) -> Result<PositionAnalysis, ProviderError> + Send + 'static,
    {
        lock(&self.responses).position = Some(Box::new(f));
        self
    }

    /// Percentages reported, in order, during evaluate_game
    pub fn with_progress_reports(self, reports: Vec<u8>) -> Self {
        lock(&self.responses).progress_reports = reports;
        self
    }

    pub fn with_ready(self, ready: bool) -> Self {
        lock(&self.responses).ready = ready;
        self
    }

    /// Get recorded calls for verification
    pub fn get_calls(&self) -> Vec<MockCall> {
        lock(&self.call_log).clone()
    }

    /// Clear call history
    pub fn clear_calls(&self) {
        lock(&self.call_log).clear()
    }
}

/// Single-line analysis with a centipawn score.
pub fn cp_analysis(cp: i32, pv: &[&str]) -> PositionAnalysis {
    analysis(vec![(Score::Centipawns(cp), pv)])
}

/// Single-line analysis with a mate score.
pub fn mate_analysis(mate: i32, pv: &[&str]) -> PositionAnalysis {
    analysis(vec![(Score::Mate(mate), pv)])
}

/// Multi-line analysis; lines are ranked in the order given.
pub fn analysis(lines: Vec<(Score, &[&str])>) -> PositionAnalysis {
    PositionAnalysis::new(
        lines
            .into_iter()
            .enumerate()
            .map(|(i, (score, pv))| {
                EngineLine::new(
                    i as u32 + 1,
                    score,
                    pv.iter().map(|m| m.to_string()).collect(),
                )
            })
            .collect(),
    )
}

#[async_trait]
impl EvaluationProvider for MockEvaluationProvider {
    fn is_ready(&self) -> bool {
        lock(&self.responses).ready
    }

    async fn evaluate_position(
        &self,
        fen: &str,
        depth: u32,
    ) -> Result<PositionAnalysis, ProviderError> {
        lock(&self.call_log).push(MockCall::EvaluatePosition {
            fen: fen.to_string(),
            depth,
        });

        let responses = lock(&self.responses);
        match responses.position {
            Some(ref f) => f(fen, depth),
            None => Err(ProviderError::Evaluation(
                "mock position response not configured".to_string(),
            )),
        }
    }

    async fn evaluate_game(
        &self,
        request: EvaluateGameRequest,
        progress: ProgressCallback,
    ) -> Vec<Option<PositionAnalysis>> {
        lock(&self.call_log).push(MockCall::EvaluateGame(request));

        let (reports, game) = {
            let responses = lock(&self.responses);
            (responses.progress_reports.clone(), responses.game.clone())
        };
        for pct in reports {
            progress(pct);
        }
        game.unwrap_or_default()
    }

    async fn stop_all_current_jobs(&self) {
        lock(&self.call_log).push(MockCall::StopAllCurrentJobs);
    }

    async fn shutdown(&self) {
        lock(&self.call_log).push(MockCall::Shutdown);
        lock(&self.responses).ready = false;
    }
}
