//! # edgequake-bookindex
//!
//! Build a back-of-book index from PDF documents with an LLM, and merge the
//! indices of several books into one composite table.
//!
//! ## Pipelines
//!
//! ```text
//! Indexer
//!  PDF ─▶ extract text per page ─▶ one prompt per page ─▶ parse lines
//!      ─▶ accumulate terms (pages ∪, first definition wins) ─▶ Term,Pages,Definition
//!
//! Combiner
//!  <prefix>1.csv … <prefix>N.csv ─▶ tag rows B1…BN ─▶ concatenate
//!      ─▶ Term,Book,Page,Definition
//! ```
//!
//! Pages are processed sequentially. When the provider rate-limits a
//! request the indexer waits (60 s by default) and reissues the same page.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_bookindex::{build_index_to_file, IndexerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = IndexerConfig::builder()
//!         .focus("Cloud, Cybersecurity, and Threat Detection")
//!         .build()?;
//!     let stats = build_index_to_file("book1.pdf", "SEC5881.csv", &config).await?;
//!     eprintln!("{} terms from {} pages", stats.distinct_terms, stats.processed_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `bookindex` binary (clap + anyhow + tracing-subscriber + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod combine;
pub mod config;
pub mod error;
pub mod index;
pub mod indexer;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod table;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use combine::{combine, combine_to_file, merge, CompositeRow, SourceRow};
pub use config::{
    CombineConfig, CombineConfigBuilder, IndexerConfig, IndexerConfigBuilder, PageNumbering,
    PageSelection, SourceSet,
};
pub use error::{BookIndexError, GenerationError};
pub use index::{IndexEntry, IndexRow, Recorded, TermIndex};
pub use indexer::{build_index, build_index_sync, build_index_to_file, index_pages};
pub use output::{CombineOutput, CombineStats, IndexOutput, IndexStats};
pub use pipeline::extract::PageText;
pub use pipeline::llm::{Annotation, LlmAnnotator, PageAnnotator};
pub use pipeline::parse::{parse_line, Candidate};
pub use progress::{IndexProgressCallback, NoopProgressCallback, ProgressCallback};
