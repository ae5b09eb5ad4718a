//! Progress-callback trait for per-page indexing events.
//!
//! Inject an [`Arc<dyn IndexProgressCallback>`] via
//! [`crate::config::IndexerConfigBuilder::progress_callback`] to receive
//! events as the indexer walks the document.
//!
//! Callers can forward events to a terminal progress bar, a log file, or a
//! channel without the library knowing how the host application reports
//! progress.
//!
//! # Example
//!
//! ```rust
//! use edgequake_bookindex::{IndexProgressCallback, IndexerConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct TermCounter {
//!     found: Arc<AtomicUsize>,
//! }
//!
//! impl IndexProgressCallback for TermCounter {
//!     fn on_page_complete(&self, page: usize, total_pages: usize, new_terms: usize) {
//!         self.found.fetch_add(new_terms, Ordering::SeqCst);
//!         eprintln!("page {page} of {total_pages}: {new_terms} new terms");
//!     }
//! }
//!
//! let counter = Arc::new(TermCounter {
//!     found: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = IndexerConfig::builder()
//!     .progress_callback(counter as Arc<dyn IndexProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the indexer as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pages are reported by their zero-based ordinal, the
/// same value that ends up in the index.
pub trait IndexProgressCallback: Send + Sync {
    /// Called once, after text extraction, before the first model request.
    fn on_run_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the request for a page is sent.
    fn on_page_start(&self, page: usize, total_pages: usize) {
        let _ = (page, total_pages);
    }

    /// Called when the provider rate-limits a page. The same page is retried
    /// after `wait_secs`.
    fn on_rate_limited(&self, page: usize, wait_secs: u64) {
        let _ = (page, wait_secs);
    }

    /// Called when the response for a page has been folded into the index.
    ///
    /// `new_terms` counts terms seen for the first time on this page.
    fn on_page_complete(&self, page: usize, total_pages: usize, new_terms: usize) {
        let _ = (page, total_pages, new_terms);
    }

    /// Called once after every page has been processed.
    fn on_run_complete(&self, total_pages: usize, distinct_terms: usize) {
        let _ = (total_pages, distinct_terms);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl IndexProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::IndexerConfig`].
pub type ProgressCallback = Arc<dyn IndexProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        waits: AtomicUsize,
        terms: AtomicUsize,
    }

    impl IndexProgressCallback for TrackingCallback {
        fn on_page_start(&self, _page: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_rate_limited(&self, _page: usize, _wait_secs: u64) {
            self.waits.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page: usize, _total_pages: usize, new_terms: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.terms.fetch_add(new_terms, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(5);
        cb.on_page_start(0, 5);
        cb.on_rate_limited(0, 60);
        cb.on_page_complete(0, 5, 1);
        cb.on_run_complete(5, 3);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_page_start(0, 2);
        tracker.on_page_complete(0, 2, 1);
        tracker.on_page_start(1, 2);
        tracker.on_rate_limited(1, 60);
        tracker.on_page_complete(1, 2, 0);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.waits.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.terms.load(Ordering::SeqCst), 1);
    }
}
