//! PDF text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and must not be driven from async tasks. All pdfium work happens in
//! one `spawn_blocking` closure that opens the document, pulls the text of
//! every selected page and drops the document before returning. The file
//! handle is therefore released on every path, including errors, and before
//! the first model request is made.

use crate::config::PageSelection;
use crate::error::BookIndexError;
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Plain text of one page, tagged with its zero-based ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub ordinal: usize,
    pub text: String,
}

impl PageText {
    pub fn new(ordinal: usize, text: impl Into<String>) -> Self {
        Self {
            ordinal,
            text: text.into(),
        }
    }
}

/// Result of extracting a document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Page count of the whole document, selected or not.
    pub total_pages: usize,
    /// Selected pages in document order.
    pub pages: Vec<PageText>,
}

/// Validate that `path` exists, is readable and starts with the `%PDF` magic.
pub fn validate_source(path: &Path) -> Result<(), BookIndexError> {
    if !path.exists() {
        return Err(BookIndexError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => BookIndexError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => BookIndexError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
        return Err(BookIndexError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    debug!("Validated PDF source: {}", path.display());
    Ok(())
}

/// Extract the plain text of the selected pages.
pub async fn extract_pages(
    pdf_path: &Path,
    password: Option<&str>,
    selection: &PageSelection,
) -> Result<ExtractedDocument, BookIndexError> {
    validate_source(pdf_path)?;

    let path = pdf_path.to_path_buf();
    let password = password.map(str::to_string);
    let selection = selection.clone();

    tokio::task::spawn_blocking(move || {
        extract_pages_blocking(&path, password.as_deref(), &selection)
    })
    .await
    .map_err(|e| BookIndexError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Bind to a pdfium library: `PDFIUM_LIB_PATH`, then the working directory,
/// then the system library path.
pub fn bind_pdfium() -> Result<Pdfium, BookIndexError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(lib) if !lib.is_empty() => Pdfium::bind_to_library(lib),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| BookIndexError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn extract_pages_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    selection: &PageSelection,
) -> Result<ExtractedDocument, BookIndexError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| classify_load_error(pdf_path, password.is_some(), format!("{:?}", e)))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let wanted = selection.to_indices(total_pages);
    // An empty document is only an error when specific pages were asked for.
    if wanted.is_empty() && *selection != PageSelection::All {
        return Err(BookIndexError::PageOutOfRange {
            page: first_requested(selection),
            total: total_pages,
        });
    }

    let mut out = Vec::with_capacity(wanted.len());
    for (ordinal, page) in pages.iter().enumerate() {
        if wanted.binary_search(&ordinal).is_err() {
            continue;
        }
        let text = page
            .text()
            .map_err(|e| BookIndexError::ExtractionFailed {
                page: ordinal,
                detail: format!("{:?}", e),
            })?
            .all();
        debug!("Extracted page {} → {} chars", ordinal, text.len());
        out.push(PageText::new(ordinal, text));
    }

    Ok(ExtractedDocument {
        total_pages,
        pages: out,
    })
}

/// Map a pdfium load failure to the most helpful fatal error.
fn classify_load_error(path: &Path, had_password: bool, detail: String) -> BookIndexError {
    let path: PathBuf = path.to_path_buf();
    if detail.to_lowercase().contains("password") {
        if had_password {
            BookIndexError::WrongPassword { path }
        } else {
            BookIndexError::PasswordRequired { path }
        }
    } else {
        BookIndexError::CorruptPdf { path, detail }
    }
}

fn first_requested(selection: &PageSelection) -> usize {
    match selection {
        PageSelection::All => 0,
        PageSelection::Single(p) => *p,
        PageSelection::Range(start, _) => *start,
        PageSelection::Set(pages) => pages.iter().copied().min().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_not_found() {
        let err = validate_source(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, BookIndexError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"Term,Pages,Definition\n").unwrap();
        let err = validate_source(f.path()).unwrap_err();
        match err {
            BookIndexError::NotAPdf { magic, .. } => assert_eq!(&magic, b"Term"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n").unwrap();
        assert!(validate_source(f.path()).is_ok());
    }

    #[test]
    fn password_errors_are_classified() {
        let p = Path::new("book.pdf");
        assert!(matches!(
            classify_load_error(p, false, "PdfiumLibraryInternalError(PasswordError)".into()),
            BookIndexError::PasswordRequired { .. }
        ));
        assert!(matches!(
            classify_load_error(p, true, "PdfiumLibraryInternalError(PasswordError)".into()),
            BookIndexError::WrongPassword { .. }
        ));
        assert!(matches!(
            classify_load_error(p, false, "FormatError".into()),
            BookIndexError::CorruptPdf { .. }
        ));
    }

    #[test]
    fn first_requested_reports_selection_start() {
        assert_eq!(first_requested(&PageSelection::Single(40)), 40);
        assert_eq!(first_requested(&PageSelection::Range(7, 9)), 7);
        assert_eq!(first_requested(&PageSelection::Set(vec![9, 3])), 3);
    }
}
