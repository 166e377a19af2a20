//! Normalizer
//!
//! Flattens the price matrix into [`PricingRecord`]s, one per touched
//! coordinate, and resolves duplicate keys. Output is ordered by record key
//! so that the same sheet read in either orientation yields the same list.

use std::collections::BTreeMap;

use ratesheet_model::{CellAddress, CellRange, IssueLocation, PricingRecord, ProcessingError, RecordKey};
use tracing::debug;

use crate::pricing::MatrixEntry;

/// Records in key order, with the cell each one came from
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<PricingRecord>,
    /// Source cell of each record, index-aligned with `records`
    pub sources: Vec<CellAddress>,
    pub issues: Vec<ProcessingError>,
}

/// Collapse scanned entries into unique records
///
/// Entries sharing a merge anchor are one fan-out and never collide. For
/// real collisions a non-merged cell beats a merged one; otherwise the entry
/// scanned last wins. Each collision is reported as an error naming both
/// cells.
pub fn normalize(entries: Vec<MatrixEntry>, sheet: &str) -> Normalized {
    let mut by_key: BTreeMap<RecordKey, MatrixEntry> = BTreeMap::new();
    let mut issues = Vec::new();

    for entry in entries {
        let Some(existing) = by_key.get(&entry.key) else {
            by_key.insert(entry.key.clone(), entry);
            continue;
        };
        if existing.anchor == entry.anchor {
            continue;
        }

        let keep_new = !(entry.merged && !existing.merged);
        let (kept, dropped) = if keep_new {
            (entry.source, existing.source)
        } else {
            (existing.source, entry.source)
        };
        debug!(key = %entry.key, kept = %kept, dropped = %dropped, "duplicate record key");
        issues.push(
            ProcessingError::error(
                "DUPLICATE_RECORD",
                format!(
                    "Two prices for {}: {} and {}; keeping {}",
                    entry.key,
                    dropped.to_a1(),
                    kept.to_a1(),
                    kept.to_a1()
                ),
            )
            .with_location(IssueLocation::range(sheet, CellRange::new(dropped, kept)))
            .with_suggestion("Remove the repeated row or column, or unmerge the overlapping cells"),
        );
        if keep_new {
            by_key.insert(entry.key.clone(), entry);
        }
    }

    let mut normalized = Normalized {
        issues,
        ..Default::default()
    };
    for (key, entry) in by_key {
        normalized.records.push(PricingRecord::from_cell(&key, &entry.cell));
        normalized.sources.push(entry.source);
    }
    normalized
}
