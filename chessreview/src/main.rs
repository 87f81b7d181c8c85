//! chessreview - review a chess game with Stockfish.
//!
//! `chessreview review` replays a game given as UCI moves, evaluates every
//! position with a pool of engine processes and prints a per-move
//! classification with accuracy figures for both sides.
//! `chessreview eval` analyses a single position.
//!
//! Engine, search and logging settings come from flags, then from the
//! environment variables listed in [`config`], then from built-in defaults.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use engine::{EngineConfig, EnginePool};
use review::{
    EvaluationProvider, GameHistory, GameReviewer, OpeningBook, ReviewOptions, ReviewProgress,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod input;
mod report;

#[derive(Parser)]
#[command(name = "chessreview", about = "Move-by-move chess game review")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Engine settings shared by every subcommand.
#[derive(clap::Args)]
struct EngineArgs {
    /// Stockfish executable (default: $CHESSREVIEW_ENGINE_PATH or auto-detect)
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Search depth per position (default: $CHESSREVIEW_DEPTH or 14)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Engine lines per position (default: $CHESSREVIEW_MULTIPV or 3)
    #[arg(long)]
    multipv: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Review a whole game.
    Review {
        /// Moves in UCI notation, e.g. `e2e4 e7e5 g1f3`
        moves: Vec<String>,

        /// Read the moves from a file instead
        #[arg(short = 'f', long)]
        moves_file: Option<PathBuf>,

        /// Starting position (default: the standard start)
        #[arg(long)]
        fen: Option<String>,

        #[command(flatten)]
        engine: EngineArgs,

        /// Engine processes to run in parallel (default: $CHESSREVIEW_WORKERS or 2)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Opening book file (default: $CHESSREVIEW_BOOK or the built-in book)
        #[arg(long, conflicts_with = "no_book")]
        book: Option<PathBuf>,

        /// Do not mark opening-book moves
        #[arg(long)]
        no_book: bool,

        /// Print JSON instead of the text report
        #[arg(long)]
        json: bool,

        /// Write the report to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Analyse a single position.
    Eval {
        /// Position in FEN
        fen: String,

        #[command(flatten)]
        engine: EngineArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Install the global subscriber. With a log directory, output goes to a
/// daily rolling file and the returned guard must be held until exit.
fn init_tracing(log_dir: Option<PathBuf>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(&dir, "chessreview");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

fn build_pool(args: &EngineArgs) -> anyhow::Result<EnginePool> {
    let config = EngineConfig {
        path: args.engine.clone().or_else(config::get_engine_path),
        multi_pv: Some(args.multipv.unwrap_or_else(config::get_multi_pv)),
        ..Default::default()
    };
    EnginePool::new(config).context("failed to locate Stockfish; set CHESSREVIEW_ENGINE_PATH")
}

fn load_book(path: Option<PathBuf>, disabled: bool) -> anyhow::Result<OpeningBook> {
    if disabled {
        return Ok(OpeningBook::empty());
    }
    match path.or_else(config::get_book_path) {
        Some(path) => OpeningBook::load(&path)
            .with_context(|| format!("failed to load opening book {}", path.display())),
        None => Ok(OpeningBook::builtin()),
    }
}

fn print_progress(progress: ReviewProgress) {
    eprint!(
        "\rReviewing: {:>3}% ({}/{} moves)",
        progress.percentage, progress.current, progress.total
    );
    if progress.percentage >= 100 {
        eprintln!();
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_review(
    moves: Vec<String>,
    moves_file: Option<PathBuf>,
    fen: Option<String>,
    engine_args: EngineArgs,
    workers: Option<usize>,
    book: Option<PathBuf>,
    no_book: bool,
    json: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let moves = input::collect_moves(&moves, moves_file.as_deref())?;
    let start_fen = fen.unwrap_or_else(|| chess::STARTING_FEN.to_string());
    let history =
        GameHistory::from_uci(&start_fen, &moves).context("the move list cannot be replayed")?;

    let options = ReviewOptions {
        depth: engine_args.depth.unwrap_or_else(config::get_depth),
        multi_pv: engine_args.multipv.unwrap_or_else(config::get_multi_pv),
        worker_count: workers.unwrap_or_else(config::get_worker_count).max(1),
    };
    let book = load_book(book, no_book)?;
    tracing::info!(plies = history.len(), book_positions = book.len(), "Game loaded");

    let reviewer = GameReviewer::new(build_pool(&engine_args)?, book);
    let result = reviewer.review(&history, &options, print_progress).await;
    reviewer.provider().shutdown().await;
    let game_review = result?;

    let rendered = if json {
        report::render_json(&game_review)?
    } else {
        report::render_text(&game_review)
    };
    report::write_output(&rendered, output.as_deref())?;
    Ok(())
}

async fn run_eval(fen: String, engine_args: EngineArgs, json: bool) -> anyhow::Result<()> {
    let depth = engine_args.depth.unwrap_or_else(config::get_depth);
    let reviewer = GameReviewer::new(build_pool(&engine_args)?, OpeningBook::empty());

    let result = reviewer.evaluate_position(&fen, depth).await;
    reviewer.provider().shutdown().await;
    let analysis = result?;

    let rendered = if json {
        report::render_json(&analysis)?
    } else {
        report::render_analysis_text(&fen, &analysis)
    };
    report::write_output(&rendered, None)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(config::get_log_dir())?;

    match cli.command {
        Commands::Review {
            moves,
            moves_file,
            fen,
            engine,
            workers,
            book,
            no_book,
            json,
            output,
        } => {
            run_review(
                moves, moves_file, fen, engine, workers, book, no_book, json, output,
            )
            .await
        }
        Commands::Eval { fen, engine, json } => run_eval(fen, engine, json).await,
    }
}
