//! Error types for the edgequake-bookindex library.
//!
//! Two error types cover two different layers:
//!
//! * [`BookIndexError`] — **Fatal**: the run cannot continue (missing PDF,
//!   wrong password, provider not configured, unreadable source table).
//!   Returned as `Err(BookIndexError)` from the `build_index*` and `combine*`
//!   entry points. Nothing is written to disk when one of these surfaces.
//!
//! * [`GenerationError`] — the outcome of a single call to the text
//!   generation service. `RateLimited` is recovered inside the page driver
//!   (pause, then reissue the same page); every other variant is promoted to
//!   a [`BookIndexError`] and aborts the run.
//!
//! Unparseable model output is not an error at all: the accumulator simply
//! skips the line.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-bookindex library.
#[derive(Debug, Error)]
pub enum BookIndexError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD> or PDF_PASSWORD.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection does not hit any page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium could not produce the text layer of a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error other than rate limiting.
    #[error("LLM API error on page {page}: {message}")]
    LlmApiError { page: usize, message: String },

    /// The provider kept rate-limiting past the configured number of waits.
    #[error("Rate limit still in effect on page {page} after {waits} waits")]
    RateLimitExceeded { page: usize, waits: u32 },

    /// The provider rejected the credentials.
    #[error("Authentication error from provider '{provider}': {detail}\nCheck OPENAI_API_KEY (or the key of your provider).")]
    AuthError { provider: String, detail: String },

    // ── Tabular errors ────────────────────────────────────────────────────
    /// A combiner source table does not exist.
    #[error("Source table not found: '{path}'")]
    SourceTableMissing { path: PathBuf },

    /// A source table exists but does not have the `Term,Pages,Definition` shape.
    #[error("Source table '{path}' is malformed: {detail}")]
    MalformedTable { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output CSV file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction needs a pdfium shared library. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium\n\
  • Place libpdfium next to the working directory\n\
  • Install pdfium system-wide\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single request to the text-generation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The service asked us to slow down (HTTP 429 and friends).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Credentials were rejected (HTTP 401/403).
    #[error("unauthorized: {0}")]
    Auth(String),

    /// Anything else.
    #[error("{0}")]
    Failed(String),
}

impl GenerationError {
    /// Promote a non-recoverable generation failure to a fatal run error.
    ///
    /// `RateLimited` is normally handled by the driver; if it does reach
    /// this point it is reported as an exhausted rate limit with zero waits.
    pub fn into_fatal(self, page: usize, provider: &str) -> BookIndexError {
        match self {
            GenerationError::RateLimited(_) => BookIndexError::RateLimitExceeded { page, waits: 0 },
            GenerationError::Auth(detail) => BookIndexError::AuthError {
                provider: provider.to_string(),
                detail,
            },
            GenerationError::Failed(message) => BookIndexError::LlmApiError { page, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_exceeded_display() {
        let e = BookIndexError::RateLimitExceeded { page: 4, waits: 3 };
        let msg = e.to_string();
        assert!(msg.contains("page 4"), "got: {msg}");
        assert!(msg.contains("3 waits"), "got: {msg}");
    }

    #[test]
    fn auth_error_display() {
        let e = BookIndexError::AuthError {
            provider: "openai".into(),
            detail: "invalid key".into(),
        };
        assert!(e.to_string().contains("openai"));
        assert!(e.to_string().contains("invalid key"));
    }

    #[test]
    fn source_table_missing_display() {
        let e = BookIndexError::SourceTableMissing {
            path: PathBuf::from("SEC5883.csv"),
        };
        assert!(e.to_string().contains("SEC5883.csv"));
    }

    #[test]
    fn generation_failure_promotes_to_api_error() {
        let e = GenerationError::Failed("HTTP 500".into()).into_fatal(7, "openai");
        match e {
            BookIndexError::LlmApiError { page, message } => {
                assert_eq!(page, 7);
                assert_eq!(message, "HTTP 500");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn generation_auth_promotes_to_auth_error() {
        let e = GenerationError::Auth("bad key".into()).into_fatal(0, "openai");
        assert!(matches!(e, BookIndexError::AuthError { .. }));
    }
}
