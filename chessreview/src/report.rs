//! Rendering a finished review as text or JSON.

use std::fmt::Write as _;
use std::path::Path;

use chess::{format_san, parse_fen, resolve_uci_move};
use review::{GameReview, MoveCategory, MoveRecord, PositionAnalysis, Side, SideSummary};

/// Full-move number of the position a FEN describes.
fn fullmove_number(fen: &str) -> Option<u32> {
    fen.split_whitespace().nth(5)?.parse().ok()
}

/// `12. Nf3` for White, `12... Nc6` for Black, with the category suffix.
fn move_label(record: &MoveRecord) -> String {
    let number = fullmove_number(&record.fen_before).unwrap_or((record.ply + 1) / 2);
    let dots = if record.side.is_white() { "." } else { "..." };
    format!("{}{} {}{}", number, dots, record.san, record.category.symbol())
}

/// SAN of a UCI move in `fen`, or the UCI text when it cannot be resolved.
fn san_in(fen: &str, uci: &str) -> String {
    parse_fen(fen)
        .ok()
        .and_then(|board| {
            resolve_uci_move(&board, uci)
                .ok()
                .map(|mv| format_san(&board, mv))
        })
        .unwrap_or_else(|| uci.to_string())
}

fn best_label(record: &MoveRecord) -> String {
    match record.best.first_move() {
        Some(uci) => san_in(&record.fen_before, uci),
        None => "-".to_string(),
    }
}

fn side_card(out: &mut String, side: Side, summary: &SideSummary) {
    let name = if side.is_white() { "White" } else { "Black" };
    let _ = writeln!(
        out,
        "{:<6} accuracy {:>5.1}%   ACPL {:>6.1}   moves {}",
        name, summary.accuracy, summary.acpl, summary.moves
    );

    let counts: Vec<String> = MoveCategory::ALL
        .iter()
        .filter(|&&category| summary.count(category) > 0)
        .map(|&category| format!("{} {}", category, summary.count(category)))
        .collect();
    if !counts.is_empty() {
        let _ = writeln!(out, "       {}", counts.join("  "));
    }
}

/// Plain-text report: one row per reviewed move followed by an accuracy
/// card for each side.
pub fn render_text(review: &GameReview) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Game review ({} moves reviewed)", review.moves.len());
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:>4}  {:<14} {:<10} {:>7} {:>5}  {}",
        "Ply", "Move", "Best", "Eval", "CPL", "Category"
    );

    for record in &review.moves {
        let eval = record
            .score_after
            .map(|score| score.display())
            .unwrap_or_else(|| "?".to_string());
        let cpl = record
            .cpl
            .map(|cpl| cpl.to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut category = record.category.to_string();
        if record.book && record.underlying_category != MoveCategory::Book {
            let _ = write!(category, " ({})", record.underlying_category);
        }
        if record.missed_mate {
            category.push_str(" [missed mate]");
        }
        let _ = writeln!(
            out,
            "{:>4}  {:<14} {:<10} {:>7} {:>5}  {}",
            record.ply,
            move_label(record),
            best_label(record),
            eval,
            cpl,
            category
        );
    }

    let _ = writeln!(out);
    side_card(&mut out, Side::White, &review.summary.white);
    side_card(&mut out, Side::Black, &review.summary.black);
    out
}

/// Ranked engine lines for a single position.
pub fn render_analysis_text(fen: &str, analysis: &PositionAnalysis) -> String {
    let mut out = String::new();
    if analysis.is_empty() {
        out.push_str("No lines reported\n");
        return out;
    }
    for line in &analysis.lines {
        let pv: Vec<String> = line.pv.iter().take(1).map(|m| san_in(fen, m)).collect();
        let rest = line.pv.iter().skip(1).cloned().collect::<Vec<_>>().join(" ");
        let _ = writeln!(
            out,
            "{:>2}. {:>7}  {} {}",
            line.rank,
            line.score.display(),
            pv.first().map(String::as_str).unwrap_or("-"),
            rest
        );
    }
    out
}

pub fn render_json<T: serde::Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Write the report to `path`, or to stdout when no path is given.
pub fn write_output(report: &str, path: Option<&Path>) -> std::io::Result<()> {
    match path {
        Some(path) => std::fs::write(path, report),
        None => {
            print!("{}", report);
            Ok(())
        }
    }
}
