//! Indexing entry points: PDF in, term index out.
//!
//! Pages are handled strictly one at a time, in document order. Each page
//! costs exactly one successful model request (rate-limited attempts are
//! retried in place), so the order of entries in the index follows the order
//! of the document. The export step only runs once every page has gone
//! through: a run that aborts writes nothing.

use crate::config::{IndexerConfig, DEFAULT_MODEL};
use crate::error::BookIndexError;
use crate::index::{Recorded, TermIndex};
use crate::output::{IndexOutput, IndexStats};
use crate::pipeline::extract::{self, PageText};
use crate::pipeline::llm::{self, LlmAnnotator, PageAnnotator};
use crate::table::{write_rows, INDEX_HEADERS};
use edgequake_llm::{LLMProvider, OpenAIProvider, ProviderFactory};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Build the term index of a PDF.
///
/// # Errors
/// Returns `Err(BookIndexError)` for every unrecoverable failure: missing or
/// unreadable PDF, wrong password, pdfium not available, provider not
/// configured, or a model error other than rate limiting.
pub async fn build_index(
    pdf_path: impl AsRef<Path>,
    config: &IndexerConfig,
) -> Result<IndexOutput, BookIndexError> {
    let total_start = Instant::now();
    let pdf_path = pdf_path.as_ref();
    info!("Starting indexing run: {}", pdf_path.display());

    // ── Step 1: Extract text (document closed before any model call) ─────
    let document =
        extract::extract_pages(pdf_path, config.password.as_deref(), &config.pages).await?;
    info!(
        "Extracted {} of {} pages",
        document.pages.len(),
        document.total_pages
    );

    // ── Step 2: Get/create provider ──────────────────────────────────────
    let provider = resolve_provider(config)?;
    let annotator = LlmAnnotator::new(provider, config);

    // ── Step 3: Walk the pages ───────────────────────────────────────────
    let (index, mut stats) = index_pages(&annotator, &document.pages, config).await?;
    stats.total_pages = document.total_pages;
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Indexing complete: {} terms from {} pages, {}ms total",
        stats.distinct_terms, stats.processed_pages, stats.total_duration_ms
    );

    let rows = index.rows(config.numbering);
    Ok(IndexOutput { index, rows, stats })
}

/// Build the index and write it to `output_path` as CSV.
///
/// The file is only created after every page succeeded.
pub async fn build_index_to_file(
    pdf_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &IndexerConfig,
) -> Result<IndexStats, BookIndexError> {
    let output = build_index(pdf_path, config).await?;
    info!("Converting to CSV...");
    write_rows(output_path.as_ref(), &INDEX_HEADERS, &output.rows)?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`build_index`].
///
/// Creates a temporary tokio runtime internally.
pub fn build_index_sync(
    pdf_path: impl AsRef<Path>,
    config: &IndexerConfig,
) -> Result<IndexOutput, BookIndexError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BookIndexError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(build_index(pdf_path, config))
}

/// Run already-extracted pages through `annotator` and accumulate the index.
///
/// This is the whole driver minus PDF and provider plumbing, so it can be
/// used with any [`PageAnnotator`]. `stats.total_pages` is set to the number
/// of pages given; callers that know the document size overwrite it.
pub async fn index_pages(
    annotator: &dyn PageAnnotator,
    pages: &[PageText],
    config: &IndexerConfig,
) -> Result<(TermIndex, IndexStats), BookIndexError> {
    let total = pages.len();
    let mut index = TermIndex::new();
    let mut stats = IndexStats {
        total_pages: total,
        ..Default::default()
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    for page in pages {
        info!("Prompting for page {}...", page.ordinal);
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page.ordinal, total);
        }

        let reply = llm::annotate_page(annotator, page.ordinal, &page.text, config).await?;
        stats.rate_limit_waits += reply.rate_limit_waits;
        stats.total_input_tokens += reply.annotation.input_tokens as u64;
        stats.total_output_tokens += reply.annotation.output_tokens as u64;

        let mut new_terms = 0;
        for line in reply.annotation.lines() {
            match index.record_line(page.ordinal, line) {
                Recorded::NewTerm => {
                    new_terms += 1;
                    stats.recorded_lines += 1;
                }
                Recorded::NewPage | Recorded::DuplicatePage => stats.recorded_lines += 1,
                Recorded::Partial => stats.partial_lines += 1,
                Recorded::Skipped => stats.skipped_lines += 1,
            }
        }
        debug!("Page {}: {} new terms", page.ordinal, new_terms);

        stats.processed_pages += 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page.ordinal, total, new_terms);
        }
    }

    stats.distinct_terms = index.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, index.len());
    }

    Ok((index, stats))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, BookIndexError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        BookIndexError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Explicit API key** (`config.api_key`): an OpenAI provider built with
///    that key, so the credential never has to live in the environment.
/// 3. **Named provider + model** (`config.provider_name`), key read by the
///    provider factory.
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 5. **`OPENAI_API_KEY`** present: OpenAI with the configured model.
/// 6. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_provider(config: &IndexerConfig) -> Result<Arc<dyn LLMProvider>, BookIndexError> {
    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref key) = config.api_key {
        match config.provider_name.as_deref() {
            Some(name) if !name.eq_ignore_ascii_case("openai") => {
                warn!("Ignoring explicit API key: it only applies to openai, not '{}'", name);
            }
            _ => {
                debug!("Using OpenAI with explicitly configured key, model {}", model);
                return Ok(Arc::new(OpenAIProvider::new(key.clone()).with_model(model)));
            }
        }
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| BookIndexError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY (or another provider key) or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
