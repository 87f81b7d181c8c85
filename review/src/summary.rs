use std::collections::BTreeMap;

use crate::types::{MoveCategory, MoveRecord, ReviewSummary, Side, SideSummary};

/// ACPL at which accuracy is halved.
const ACCURACY_HALF_ACPL: f64 = 50.0;

/// Accuracy percentage from average centipawn loss, clamped to [0, 100].
pub fn accuracy_from_acpl(acpl: f64) -> f64 {
    (100.0 / (1.0 + acpl / ACCURACY_HALF_ACPL)).clamp(0.0, 100.0)
}

/// Summarise one side's records. Moves without a known CPL count toward the
/// category tallies but not toward ACPL.
pub fn summarize_side(records: &[MoveRecord], side: Side) -> SideSummary {
    let mut counts: BTreeMap<MoveCategory, u32> =
        MoveCategory::ALL.iter().map(|&c| (c, 0)).collect();
    let mut cpl_total = 0i64;
    let mut cpl_moves = 0u32;
    let mut book_moves = 0;
    let mut moves = 0;

    for record in records.iter().filter(|r| r.side == side) {
        moves += 1;
        *counts.entry(record.category).or_insert(0) += 1;
        if record.book {
            book_moves += 1;
        }
        if let Some(cpl) = record.cpl {
            cpl_total += i64::from(cpl);
            cpl_moves += 1;
        }
    }

    let acpl = if cpl_moves == 0 {
        0.0
    } else {
        cpl_total as f64 / f64::from(cpl_moves)
    };

    SideSummary {
        acpl,
        accuracy: accuracy_from_acpl(acpl),
        counts,
        book_moves,
        moves,
    }
}

pub fn summarize(records: &[MoveRecord]) -> ReviewSummary {
    ReviewSummary {
        white: summarize_side(records, Side::White),
        black: summarize_side(records, Side::Black),
    }
}
