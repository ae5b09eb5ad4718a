//! The term index: terms → page ordinals + first definition.
//!
//! Entries are created only through [`TermIndex::record`], after the
//! candidate has passed validation, so an invalid or empty term never leaves
//! a stray entry behind. Once an entry exists it only grows: later
//! occurrences add page ordinals, the definition stays the one recorded
//! first.
//!
//! Export order is first-seen order, which keeps runs over the same
//! responses byte-identical.

use crate::config::PageNumbering;
use crate::pipeline::parse::{parse_line, Candidate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Accumulated record for one term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub term: String,
    pub pages: BTreeSet<usize>,
    pub definition: String,
}

impl IndexEntry {
    /// Ascending, `", "`-joined page list.
    pub fn pages_label(&self, numbering: PageNumbering) -> String {
        self.pages
            .iter()
            .map(|&p| numbering.render(p).to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One exported row of the index table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    #[serde(rename = "Term")]
    pub term: String,
    #[serde(rename = "Pages")]
    pub pages: String,
    #[serde(rename = "Definition")]
    pub definition: String,
}

/// What [`TermIndex::record`] did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// First time this term was seen; entry created.
    NewTerm,
    /// Known term, page added to its set.
    NewPage,
    /// Known term already listed on this page.
    DuplicatePage,
    /// Only one side was usable (or the term was "none" with a definition).
    Partial,
    /// Nothing to record.
    Skipped,
}

/// Term → (pages, definition) accumulator for one document.
#[derive(Debug, Default, Clone)]
pub struct TermIndex {
    entries: Vec<IndexEntry>,
    by_term: HashMap<String, usize>,
}

impl TermIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one parsed candidate for `page` into the index.
    ///
    /// Never fails: invalid candidates are skipped, and partial ones are
    /// only reported through the return value.
    pub fn record(&mut self, page: usize, candidate: Option<Candidate>) -> Recorded {
        let Some(Candidate { term, definition }) = candidate else {
            return Recorded::Skipped;
        };

        if term.is_empty() || definition.is_empty() || term.eq_ignore_ascii_case("none") {
            return if term.is_empty() && definition.is_empty() {
                Recorded::Skipped
            } else {
                Recorded::Partial
            };
        }

        match self.by_term.get(&term) {
            Some(&slot) => {
                let entry = &mut self.entries[slot];
                if entry.definition.is_empty() {
                    entry.definition = definition;
                }
                if entry.pages.insert(page) {
                    Recorded::NewPage
                } else {
                    Recorded::DuplicatePage
                }
            }
            None => {
                debug!("New term on page {}: {:?}", page, term);
                self.by_term.insert(term.clone(), self.entries.len());
                self.entries.push(IndexEntry {
                    term,
                    pages: BTreeSet::from([page]),
                    definition,
                });
                Recorded::NewTerm
            }
        }
    }

    /// Parse one response line and record it, logging partial matches.
    pub fn record_line(&mut self, page: usize, line: &str) -> Recorded {
        let outcome = self.record(page, parse_line(line));
        if outcome == Recorded::Partial {
            warn!("Partial or unclear match on page {}: '{}'", page, line);
        }
        outcome
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<&IndexEntry> {
        self.by_term.get(term).map(|&slot| &self.entries[slot])
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Export rows with zero-based page ordinals.
    pub fn export(&self) -> Vec<IndexRow> {
        self.rows(PageNumbering::ZeroBased)
    }

    /// Export one row per term, in first-seen order.
    pub fn rows(&self, numbering: PageNumbering) -> Vec<IndexRow> {
        self.entries
            .iter()
            .map(|e| IndexRow {
                term: e.term.clone(),
                pages: e.pages_label(numbering),
                definition: e.definition.clone(),
            })
            .collect()
    }
}
