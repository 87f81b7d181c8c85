//! A pool of Stockfish processes serving [`review::EvaluationProvider`].
//!
//! A game batch is pushed onto a shared job queue and `worker_count` workers,
//! each owning one engine process, pull positions from it until it drains.
//! Cancellation works by generation: `stop_all_current_jobs` bumps the
//! counter and sends `stop` to every live engine, and workers drop any job
//! that belongs to an older generation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chess::{parse_fen, Board, Color, EngineLine, PositionAnalysis, Score};
use cozy_chess::GameStatus;
use review::{EvaluateGameRequest, EvaluationProvider, ProgressCallback, ProviderError};
use tokio::sync::{mpsc, Mutex};

use crate::stockfish::{find_stockfish_path, EngineConfig, EngineError, StockfishEngine};
use crate::EngineCommand;

/// One position of a game batch.
#[derive(Debug)]
struct PoolJob {
    index: usize,
    fen: String,
}

type JobResult = (usize, Option<PositionAnalysis>);

#[derive(Default)]
struct PoolShared {
    generation: AtomicU64,
    ready: AtomicBool,
    next_engine_id: AtomicU64,
    engines: std::sync::Mutex<HashMap<u64, mpsc::Sender<EngineCommand>>>,
}

impl PoolShared {
    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn register(&self, sender: mpsc::Sender<EngineCommand>) -> u64 {
        let id = self.next_engine_id.fetch_add(1, Ordering::Relaxed);
        self.engines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, sender);
        id
    }

    fn unregister(&self, id: u64) {
        self.engines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&id);
    }

    fn senders(&self) -> Vec<mpsc::Sender<EngineCommand>> {
        self.engines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .cloned()
            .collect()
    }
}

/// Stockfish-backed evaluation provider.
pub struct EnginePool {
    config: EngineConfig,
    shared: Arc<PoolShared>,
    /// Engine used for single-position analysis, spawned on first use.
    live: Mutex<Option<(u64, StockfishEngine)>>,
}

impl EnginePool {
    /// Create a pool. The engine executable is resolved here so a missing
    /// binary is reported before any review starts.
    pub fn new(mut config: EngineConfig) -> Result<Self, EngineError> {
        let path = find_stockfish_path(config.path.as_deref()).ok_or(EngineError::NotFound)?;
        tracing::info!(path = ?path, "Engine pool created");
        config.path = Some(path);

        let shared = PoolShared::default();
        shared.ready.store(true, Ordering::SeqCst);

        Ok(Self {
            config,
            shared: Arc::new(shared),
            live: Mutex::new(None),
        })
    }

    fn worker_config(&self, worker_id: usize, multi_pv: u32) -> EngineConfig {
        EngineConfig {
            threads: self.config.threads.or(Some(1)),
            multi_pv: Some(multi_pv),
            label: Some(format!("review-worker-{}", worker_id)),
            ..self.config.clone()
        }
    }
}

/// Analysis for a position with no legal continuation, or `None` when the
/// game is still running.
///
/// Checkmate yields a single `Mate(±1)` line pointing at the side that
/// delivered mate; a drawn position yields `Centipawns(0)`. Both lines have
/// an empty PV.
pub fn terminal_analysis(board: &Board) -> Option<PositionAnalysis> {
    let score = match board.status() {
        GameStatus::Ongoing => return None,
        GameStatus::Won => match board.side_to_move() {
            Color::White => Score::Mate(-1),
            Color::Black => Score::Mate(1),
        },
        GameStatus::Drawn => Score::Centipawns(0),
    };
    Some(PositionAnalysis::new(vec![EngineLine::new(1, score, vec![])]))
}

/// Evaluate one queued position, spawning the worker's engine on first
/// need. Only a failed spawn is an error; analysis failures become `None`
/// and discard the engine so the next job starts a fresh one.
async fn analyse_job(
    worker_id: usize,
    job: &PoolJob,
    engine: &mut Option<(u64, StockfishEngine)>,
    shared: &PoolShared,
    config: &EngineConfig,
    depth: u32,
    multi_pv: u32,
) -> Result<Option<PositionAnalysis>, EngineError> {
    let board = match parse_fen(&job.fen) {
        Ok(board) => board,
        Err(e) => {
            tracing::warn!(worker_id, index = job.index, "Skipping position: {}", e);
            return Ok(None);
        }
    };
    if let Some(analysis) = terminal_analysis(&board) {
        return Ok(Some(analysis));
    }

    if engine.is_none() {
        let spawned = StockfishEngine::spawn_with_config(config.clone()).await?;
        let id = shared.register(spawned.command_sender());
        *engine = Some((id, spawned));
    }
    let Some((_, sf)) = engine.as_mut() else {
        return Ok(None);
    };

    match sf.analyse(&job.fen, depth, multi_pv).await {
        Ok(analysis) if !analysis.is_empty() => Ok(Some(analysis)),
        Ok(_) => Ok(None),
        Err(e) => {
            tracing::warn!(worker_id, index = job.index, "Engine analysis failed: {}", e);
            if let Some((id, sf)) = engine.take() {
                shared.unregister(id);
                sf.shutdown().await;
            }
            Ok(None)
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_pool_worker(
    worker_id: usize,
    job_rx: Arc<Mutex<mpsc::Receiver<PoolJob>>>,
    result_tx: mpsc::Sender<JobResult>,
    shared: Arc<PoolShared>,
    config: EngineConfig,
    depth: u32,
    multi_pv: u32,
    generation: u64,
) {
    tracing::debug!(worker_id, "Pool worker started");
    let mut engine: Option<(u64, StockfishEngine)> = None;

    loop {
        let job = {
            let mut rx = job_rx.lock().await;
            match rx.recv().await {
                Some(job) => job,
                None => break,
            }
        };
        if shared.generation() != generation {
            tracing::debug!(worker_id, "Batch cancelled, worker exiting");
            break;
        }

        let outcome =
            analyse_job(worker_id, &job, &mut engine, &shared, &config, depth, multi_pv).await;
        let analysis = match outcome {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::error!(worker_id, "Failed to spawn engine: {}", e);
                let _ = result_tx.send((job.index, None)).await;
                break;
            }
        };

        if shared.generation() != generation {
            tracing::debug!(worker_id, index = job.index, "Discarding result of cancelled batch");
            break;
        }
        tracing::trace!(worker_id, index = job.index, analysed = analysis.is_some(), "Position done");
        if result_tx.send((job.index, analysis)).await.is_err() {
            break;
        }
    }

    if let Some((id, sf)) = engine.take() {
        shared.unregister(id);
        sf.shutdown().await;
    }
    tracing::debug!(worker_id, "Pool worker exiting");
}

#[async_trait]
impl EvaluationProvider for EnginePool {
    fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::SeqCst)
    }

    async fn evaluate_position(
        &self,
        fen: &str,
        depth: u32,
    ) -> Result<PositionAnalysis, ProviderError> {
        if !self.is_ready() {
            return Err(ProviderError::NotReady);
        }
        let board = parse_fen(fen).map_err(|e| ProviderError::Evaluation(e.to_string()))?;
        if let Some(analysis) = terminal_analysis(&board) {
            return Ok(analysis);
        }

        let generation = self.shared.generation();
        let mut live = self.live.lock().await;
        if live.is_none() {
            let config = EngineConfig {
                label: Some("live-analysis".to_string()),
                ..self.config.clone()
            };
            let engine = StockfishEngine::spawn_with_config(config)
                .await
                .map_err(|e| ProviderError::Evaluation(e.to_string()))?;
            let id = self.shared.register(engine.command_sender());
            *live = Some((id, engine));
        }

        let multi_pv = self.config.multi_pv.unwrap_or(1);
        let result = match live.as_mut() {
            Some((_, engine)) => engine.analyse(fen, depth, multi_pv).await,
            None => Err(EngineError::ChannelClosed),
        };

        match result {
            Ok(_) if self.shared.generation() != generation => Err(ProviderError::Cancelled),
            Ok(analysis) => Ok(analysis),
            Err(e) => {
                if let Some((id, engine)) = live.take() {
                    self.shared.unregister(id);
                    engine.shutdown().await;
                }
                Err(ProviderError::Evaluation(e.to_string()))
            }
        }
    }

    async fn evaluate_game(
        &self,
        request: EvaluateGameRequest,
        progress: ProgressCallback,
    ) -> Vec<Option<PositionAnalysis>> {
        let total = request.fens.len();
        if !self.is_ready() {
            tracing::warn!("Engine pool is shut down, refusing batch");
            return Vec::new();
        }
        let mut results: Vec<Option<PositionAnalysis>> = vec![None; total];
        if total == 0 {
            return results;
        }

        let generation = self.shared.generation();
        let worker_count = request.worker_count.clamp(1, total);
        tracing::info!(
            positions = total,
            workers = worker_count,
            depth = request.depth,
            multi_pv = request.multi_pv,
            "Evaluating game"
        );

        let (job_tx, job_rx) = mpsc::channel::<PoolJob>(total);
        for (index, fen) in request.fens.into_iter().enumerate() {
            if job_tx.send(PoolJob { index, fen }).await.is_err() {
                break;
            }
        }
        drop(job_tx);

        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::channel::<JobResult>(total);
        for worker_id in 0..worker_count {
            tokio::spawn(run_pool_worker(
                worker_id,
                Arc::clone(&job_rx),
                result_tx.clone(),
                Arc::clone(&self.shared),
                self.worker_config(worker_id, request.multi_pv),
                request.depth,
                request.multi_pv,
                generation,
            ));
        }
        drop(result_tx);

        let mut done = 0usize;
        while let Some((index, analysis)) = result_rx.recv().await {
            if let Some(slot) = results.get_mut(index) {
                *slot = analysis;
            }
            done += 1;
            progress(((done * 100) / total) as u8);
        }

        let analysed = results.iter().filter(|r| r.is_some()).count();
        if self.shared.generation() != generation {
            tracing::info!(analysed, total, "Game evaluation cancelled");
        } else {
            tracing::info!(analysed, total, "Game evaluation finished");
        }
        results
    }

    async fn stop_all_current_jobs(&self) {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let senders = self.shared.senders();
        tracing::debug!(generation, engines = senders.len(), "Stopping current jobs");
        for sender in senders {
            let _ = sender.send(EngineCommand::Stop).await;
        }
    }

    async fn shutdown(&self) {
        self.stop_all_current_jobs().await;
        self.shared.ready.store(false, Ordering::SeqCst);
        if let Some((id, engine)) = self.live.lock().await.take() {
            self.shared.unregister(id);
            engine.shutdown().await;
        }
        tracing::info!("Engine pool shut down");
    }
}
