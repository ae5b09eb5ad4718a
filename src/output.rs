//! Run results returned by the indexer and the combiner.

use crate::combine::CompositeRow;
use crate::index::{IndexRow, TermIndex};
use serde::{Deserialize, Serialize};

/// Everything an indexing run produced.
#[derive(Debug, Clone)]
pub struct IndexOutput {
    /// The accumulated index.
    pub index: TermIndex,
    /// Exported rows, already rendered with the configured page numbering.
    pub rows: Vec<IndexRow>,
    pub stats: IndexStats,
}

/// Counters for an indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Page count of the source document.
    pub total_pages: usize,
    /// Pages sent to the model.
    pub processed_pages: usize,
    /// Distinct terms in the index.
    pub distinct_terms: usize,
    /// Response lines that added a term or a page.
    pub recorded_lines: usize,
    /// Response lines with no usable term/definition.
    pub skipped_lines: usize,
    /// Lines where only one of term/definition was usable.
    pub partial_lines: usize,
    /// Rate-limit pauses across the run.
    pub rate_limit_waits: u32,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
}

/// Everything a combiner run produced.
#[derive(Debug, Clone)]
pub struct CombineOutput {
    pub rows: Vec<CompositeRow>,
    pub stats: CombineStats,
}

/// Counters for a combiner run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombineStats {
    /// Number of source tables read.
    pub books: usize,
    /// Rows contributed by each book, in book order.
    pub rows_per_book: Vec<usize>,
    /// Rows in the composite table.
    pub total_rows: usize,
}
