//! Configuration for the chessreview CLI.
//!
//! Every tunable has a compile-time default and can be overridden at runtime
//! through a dedicated environment variable. Command-line flags, where
//! present, take precedence over both.

use std::path::PathBuf;
use std::str::FromStr;

use review::{DEFAULT_DEPTH, DEFAULT_MULTI_PV, DEFAULT_WORKER_COUNT};

pub const ENGINE_PATH_VAR: &str = "CHESSREVIEW_ENGINE_PATH";
pub const DEPTH_VAR: &str = "CHESSREVIEW_DEPTH";
pub const MULTIPV_VAR: &str = "CHESSREVIEW_MULTIPV";
pub const WORKERS_VAR: &str = "CHESSREVIEW_WORKERS";
pub const BOOK_VAR: &str = "CHESSREVIEW_BOOK";
pub const LOG_DIR_VAR: &str = "CHESSREVIEW_LOG_DIR";

/// Parse `raw`, falling back to `default` when it is absent or malformed.
fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn path_var(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

/// Get the Stockfish executable path.
///
/// Priority:
/// 1. `CHESSREVIEW_ENGINE_PATH` env variable if set
/// 2. `None`, meaning common install locations are probed
pub fn get_engine_path() -> Option<PathBuf> {
    path_var(ENGINE_PATH_VAR)
}

/// Get the search depth per position.
///
/// Priority:
/// 1. `CHESSREVIEW_DEPTH` env variable if set (falls back to the default if
///    it cannot be parsed)
/// 2. `14` as fallback
pub fn get_depth() -> u32 {
    parse_or(std::env::var(DEPTH_VAR).ok(), DEFAULT_DEPTH)
}

/// Get the number of MultiPV lines requested per position.
pub fn get_multi_pv() -> u32 {
    parse_or(std::env::var(MULTIPV_VAR).ok(), DEFAULT_MULTI_PV)
}

/// Get the number of engine processes used for a review.
pub fn get_worker_count() -> usize {
    parse_or(std::env::var(WORKERS_VAR).ok(), DEFAULT_WORKER_COUNT)
}

/// Get the opening book file. `None` selects the built-in book.
pub fn get_book_path() -> Option<PathBuf> {
    path_var(BOOK_VAR)
}

/// Get the directory for daily rolling log files. `None` logs to stderr.
pub fn get_log_dir() -> Option<PathBuf> {
    path_var(LOG_DIR_VAR)
}
