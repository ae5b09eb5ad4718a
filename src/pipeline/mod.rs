//! Pipeline stages of the indexer.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ llm ──▶ parse ──▶ crate::index
//! (pdfium)   (model)  (ladder)   (accumulator)
//! ```
//!
//! 1. [`extract`] — validate the source and pull plain text per page; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`llm`]     — one request per page through a [`llm::PageAnnotator`],
//!    with pause-and-retry on rate limiting; the only stage with network I/O
//! 3. [`parse`]   — split each response line into a term/definition candidate

pub mod extract;
pub mod llm;
pub mod parse;
