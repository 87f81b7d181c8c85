#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use review::{
    EngineLine, EvaluateGameRequest, EvaluationProvider, PositionAnalysis, ProgressCallback,
    ProviderError, Score,
};

/// Provider answering from a table keyed by board placement.
#[derive(Default)]
pub struct ScriptedProvider {
    table: HashMap<String, PositionAnalysis>,
    requests: Mutex<Vec<EvaluateGameRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer positions with this placement with a single line.
    pub fn with(mut self, placement: &str, score: Score, pv: &[&str]) -> Self {
        let line = EngineLine::new(1, score, pv.iter().map(|m| m.to_string()).collect());
        self.table
            .insert(placement.to_string(), PositionAnalysis::new(vec![line]));
        self
    }

    pub fn requests(&self) -> Vec<EvaluateGameRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn lookup(&self, fen: &str) -> Option<PositionAnalysis> {
        let placement = fen.split_whitespace().next().unwrap_or("");
        self.table.get(placement).cloned()
    }
}

#[async_trait]
impl EvaluationProvider for ScriptedProvider {
    fn is_ready(&self) -> bool {
        true
    }

    async fn evaluate_position(
        &self,
        fen: &str,
        _depth: u32,
    ) -> Result<PositionAnalysis, ProviderError> {
        self.lookup(fen)
            .ok_or_else(|| ProviderError::Evaluation(format!("no script for {fen}")))
    }

    async fn evaluate_game(
        &self,
        request: EvaluateGameRequest,
        progress: ProgressCallback,
    ) -> Vec<Option<PositionAnalysis>> {
        let total = request.fens.len().max(1);
        let results = request
            .fens
            .iter()
            .enumerate()
            .map(|(i, fen)| {
                progress((((i + 1) * 100) / total) as u8);
                self.lookup(fen)
            })
            .collect();
        self.requests.lock().unwrap().push(request);
        results
    }

    async fn stop_all_current_jobs(&self) {}

    async fn shutdown(&self) {}
}

pub fn uci(moves: &str) -> Vec<&str> {
    moves.split_whitespace().collect()
}
