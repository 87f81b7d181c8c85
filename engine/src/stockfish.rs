use crate::uci::{parse_uci_message, UciMessage};
use crate::{EngineCommand, EngineEvent, EngineInfo};
use chess::{parse_fen, EngineLine, PositionAnalysis, Score};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::mpsc;

/// Bound on the `uci`/`uciok` and `isready`/`readyok` handshakes.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Stockfish not found")]
    NotFound,
    #[error("Failed to spawn {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Engine has no stdin")]
    NoStdin,
    #[error("Engine has no stdout")]
    NoStdout,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Timeout waiting for engine to respond")]
    HandshakeTimeout,
    #[error("Engine closed during handshake")]
    ClosedDuringHandshake,
    #[error("Engine channel closed")]
    ChannelClosed,
    #[error("Engine error: {0}")]
    Engine(String),
    #[error(transparent)]
    Fen(#[from] chess::FenError),
}

pub struct StockfishEngine {
    process: Child,
    command_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    multi_pv: u32,
    label: String,
}

/// Configuration for spawning and tuning an engine process.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Executable to run; searched for in common locations when unset.
    pub path: Option<PathBuf>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    pub multi_pv: Option<u32>,
    /// Name used in log lines.
    pub label: Option<String>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish instance with full configuration.
    #[tracing::instrument(level = "info")]
    pub async fn spawn_with_config(config: EngineConfig) -> Result<Self, EngineError> {
        let label = config
            .label
            .clone()
            .unwrap_or_else(|| "stockfish".to_string());
        let path = find_stockfish_path(config.path.as_deref()).ok_or(EngineError::NotFound)?;
        tracing::info!(label = %label, path = ?path, "Spawning engine process");

        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                tracing::error!(label = %label, "Failed to spawn engine: {}", source);
                EngineError::Spawn {
                    path: path.clone(),
                    source,
                }
            })?;

        let mut stdin = process.stdin.take().ok_or(EngineError::NoStdin)?;
        let stdout = process.stdout.take().ok_or(EngineError::NoStdout)?;

        let (command_tx, command_rx) = mpsc::channel::<EngineCommand>(32);
        let (event_tx, mut event_rx) = mpsc::channel::<EngineEvent>(256);

        // Spawn output reader task
        let reader_label = label.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::debug!(label = %reader_label, "Engine stdout EOF");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        tracing::trace!(label = %reader_label, "UCI << {}", trimmed);

                        let event = match parse_uci_message(trimmed) {
                            Ok(UciMessage::UciOk) | Ok(UciMessage::ReadyOk) => EngineEvent::Ready,
                            Ok(UciMessage::BestMove { mv, .. }) => EngineEvent::BestMove(mv),
                            Ok(UciMessage::Info(info)) => EngineEvent::Info(info),
                            Ok(UciMessage::Id { .. }) => continue,
                            Err(_) => {
                                tracing::trace!(label = %reader_label, "Ignoring UCI line: {}", trimmed);
                                continue;
                            }
                        };

                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(label = %reader_label, "Error reading engine stdout: {}", e);
                        let _ = event_tx.send(EngineEvent::Error(e.to_string())).await;
                        break;
                    }
                }
            }
        });

        write_line(&mut stdin, "uci").await?;
        wait_ready(&mut event_rx).await?;
        tracing::debug!(label = %label, "Received uciok");

        if let Some(threads) = config.threads {
            let threads = threads.clamp(1, 16);
            write_line(&mut stdin, &format!("setoption name Threads value {}", threads)).await?;
        }
        if let Some(hash_mb) = config.hash_mb {
            let hash_mb = hash_mb.clamp(1, 2048);
            write_line(&mut stdin, &format!("setoption name Hash value {}", hash_mb)).await?;
        }
        let multi_pv = config.multi_pv.unwrap_or(1).max(1);
        write_line(&mut stdin, &format!("setoption name MultiPV value {}", multi_pv)).await?;

        write_line(&mut stdin, "isready").await?;
        wait_ready(&mut event_rx).await?;

        tokio::spawn(run_command_writer(label.clone(), stdin, command_rx));

        tracing::info!(label = %label, multi_pv, "Engine initialized");
        Ok(Self {
            process,
            command_tx,
            event_rx,
            multi_pv,
            label,
        })
    }

    /// Send a command to the engine
    pub async fn send_command(&self, cmd: EngineCommand) -> Result<(), EngineError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| EngineError::ChannelClosed)
    }

    /// A sender that can interrupt a running search from another task.
    pub fn command_sender(&self) -> mpsc::Sender<EngineCommand> {
        self.command_tx.clone()
    }

    /// Receive an event from the engine
    pub async fn recv_event(&mut self) -> Option<EngineEvent> {
        self.event_rx.recv().await
    }

    /// Search `fen` to `depth` and collect the final line for each MultiPV
    /// rank. Scores are returned from White's point of view.
    ///
    /// A `stop` sent while searching ends the search early; whatever lines
    /// were reported up to that point are returned.
    pub async fn analyse(
        &mut self,
        fen: &str,
        depth: u32,
        multi_pv: u32,
    ) -> Result<PositionAnalysis, EngineError> {
        let white_to_move = parse_fen(fen)?.side_to_move() == cozy_chess::Color::White;

        while self.event_rx.try_recv().is_ok() {}

        let multi_pv = multi_pv.max(1);
        if multi_pv != self.multi_pv {
            self.send_command(EngineCommand::SetOption {
                name: "MultiPV".to_string(),
                value: Some(multi_pv.to_string()),
            })
            .await?;
            self.multi_pv = multi_pv;
        }

        self.send_command(EngineCommand::SetPosition {
            fen: fen.to_string(),
        })
        .await?;
        self.send_command(EngineCommand::Go { depth }).await?;

        let mut lines: BTreeMap<u32, (u32, EngineLine)> = BTreeMap::new();
        loop {
            match self.recv_event().await {
                Some(EngineEvent::Info(info)) => {
                    record_line(&mut lines, info, white_to_move, multi_pv);
                }
                Some(EngineEvent::BestMove(mv)) => {
                    tracing::debug!(
                        label = %self.label,
                        best = ?mv,
                        lines = lines.len(),
                        depth = lines.get(&1).map(|(d, _)| *d),
                        "Search finished"
                    );
                    break;
                }
                Some(EngineEvent::Error(e)) => return Err(EngineError::Engine(e)),
                Some(EngineEvent::Ready) => continue,
                None => return Err(EngineError::ChannelClosed),
            }
        }

        Ok(PositionAnalysis::new(
            lines.into_values().map(|(_, line)| line).collect(),
        ))
    }

    /// Shutdown the engine
    pub async fn shutdown(mut self) {
        let _ = self.send_command(EngineCommand::Quit).await;
        let _ = tokio::time::timeout(Duration::from_secs(1), self.process.wait()).await;
        let _ = self.process.kill().await;
        tracing::debug!(label = %self.label, "Engine shut down");
    }
}

/// Keep the deepest exact-score line per MultiPV rank, converted to White's
/// point of view.
fn record_line(
    lines: &mut BTreeMap<u32, (u32, EngineLine)>,
    info: EngineInfo,
    white_to_move: bool,
    multi_pv: u32,
) {
    let Some(score) = info.score else { return };
    if info.bound || info.pv.is_empty() {
        return;
    }
    let rank = info.multipv.unwrap_or(1);
    let depth = info.depth.unwrap_or(0);
    if rank > multi_pv || lines.get(&rank).is_some_and(|(seen, _)| *seen > depth) {
        return;
    }
    let score = Score::from_side_to_move(score, white_to_move);
    lines.insert(rank, (depth, EngineLine::new(rank, score, info.pv)));
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> Result<(), EngineError> {
    tracing::trace!("UCI >> {}", line);
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await?;
    Ok(())
}

async fn wait_ready(event_rx: &mut mpsc::Receiver<EngineEvent>) -> Result<(), EngineError> {
    let wait = tokio::time::timeout(HANDSHAKE_TIMEOUT, async {
        while let Some(event) = event_rx.recv().await {
            if matches!(event, EngineEvent::Ready) {
                return Ok(());
            }
        }
        Err(EngineError::ClosedDuringHandshake)
    })
    .await;

    match wait {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Timeout waiting for engine handshake");
            Err(EngineError::HandshakeTimeout)
        }
    }
}

/// Owns the engine's stdin and turns commands into UCI lines.
async fn run_command_writer(
    label: String,
    mut stdin: ChildStdin,
    mut command_rx: mpsc::Receiver<EngineCommand>,
) {
    while let Some(cmd) = command_rx.recv().await {
        let quit = matches!(cmd, EngineCommand::Quit);
        let line = format_command(&cmd);
        if let Err(e) = write_line(&mut stdin, &line).await {
            tracing::error!(label = %label, "Failed to write to engine stdin: {}", e);
            break;
        }
        if quit {
            break;
        }
    }
    tracing::debug!(label = %label, "Command writer exiting");
}

fn format_command(cmd: &EngineCommand) -> String {
    match cmd {
        EngineCommand::SetPosition { fen } => format!("position fen {}", fen),
        EngineCommand::SetOption { name, value } => match value {
            Some(val) => format!("setoption name {} value {}", name, val),
            None => format!("setoption name {}", name),
        },
        EngineCommand::Go { depth } => format!("go depth {}", depth),
        EngineCommand::Stop => "stop".to_string(),
        EngineCommand::Quit => "quit".to_string(),
    }
}

/// Resolve the engine executable.
///
/// An explicitly configured path is used as-is; otherwise common install
/// locations are probed.
pub fn find_stockfish_path(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        return Some(path.to_path_buf());
    }

    let paths = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
        "stockfish", // In PATH
    ];

    paths
        .iter()
        .find(|path_str| {
            (Path::new(path_str).exists() || **path_str == "stockfish")
                && std::process::Command::new(path_str)
                    .arg("--help")
                    .output()
                    .is_ok()
        })
        .map(PathBuf::from)
}
