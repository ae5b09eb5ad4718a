//! Combiner: concatenate per-book index tables into one composite table.
//!
//! Every source row is tagged with `B{i}`, the 1-based position of its table
//! in the configured source list, and rows are emitted in source order with
//! the order inside each source preserved. Identical terms from different
//! books stay separate rows; reconciling them is left to whoever reads the
//! composite table.

use crate::config::CombineConfig;
use crate::error::BookIndexError;
use crate::output::{CombineOutput, CombineStats};
use crate::table::{read_rows, write_rows, COMPOSITE_HEADERS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One row of a per-book index table as read back from disk.
///
/// `Definition` may be absent (blank cell or missing column); it is coerced
/// to an empty string when merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
    #[serde(rename = "Term")]
    pub term: String,
    #[serde(rename = "Pages")]
    pub pages: String,
    #[serde(rename = "Definition", default)]
    pub definition: Option<String>,
}

/// One row of the composite table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeRow {
    #[serde(rename = "Term")]
    pub term: String,
    #[serde(rename = "Book")]
    pub book: String,
    #[serde(rename = "Page")]
    pub page: String,
    #[serde(rename = "Definition")]
    pub definition: String,
}

/// Book identifier for the 1-based source position `n`.
pub fn book_id(n: usize) -> String {
    format!("B{n}")
}

/// Tag and concatenate source tables. `sources[0]` becomes `B1`.
pub fn merge(sources: Vec<Vec<SourceRow>>) -> Vec<CompositeRow> {
    sources
        .into_iter()
        .enumerate()
        .flat_map(|(i, rows)| {
            let book = book_id(i + 1);
            rows.into_iter().map(move |row| CompositeRow {
                term: row.term,
                book: book.clone(),
                page: row.pages,
                definition: row.definition.unwrap_or_default(),
            })
        })
        .collect()
}

/// Read every configured source table and merge them in memory.
///
/// Any missing or malformed source aborts the run.
pub fn combine(config: &CombineConfig) -> Result<CombineOutput, BookIndexError> {
    let paths = config.sources.paths();
    info!("Combining {} source tables", paths.len());

    let mut sources = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        let rows: Vec<SourceRow> = read_rows(path)?;
        info!("{} ← {} ({} rows)", book_id(i + 1), path.display(), rows.len());
        sources.push(rows);
    }

    let rows_per_book: Vec<usize> = sources.iter().map(Vec::len).collect();
    let rows = merge(sources);
    let stats = CombineStats {
        books: rows_per_book.len(),
        total_rows: rows.len(),
        rows_per_book,
    };

    Ok(CombineOutput { rows, stats })
}

/// Combine and write the composite table to `config.output`.
pub fn combine_to_file(config: &CombineConfig) -> Result<CombineStats, BookIndexError> {
    let output = combine(config)?;
    write_composite(&config.output, &output.rows)?;
    Ok(output.stats)
}

/// Write composite rows with the `Term,Book,Page,Definition` header.
pub fn write_composite(path: &Path, rows: &[CompositeRow]) -> Result<(), BookIndexError> {
    write_rows(path, &COMPOSITE_HEADERS, rows)
}
