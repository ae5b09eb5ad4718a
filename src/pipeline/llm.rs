//! Model interaction: send one page, get its response lines back.
//!
//! The driver talks to the text-generation service only through the
//! [`PageAnnotator`] trait. [`LlmAnnotator`] is the production
//! implementation over an `edgequake_llm` provider; tests plug in scripted
//! annotators.
//!
//! ## Rate limits
//!
//! A rate-limited request is not a page failure. [`annotate_page`] sleeps
//! for `rate_limit_backoff_secs` and reissues the request for the *same*
//! page, so no page is skipped or processed twice. Every other failure is
//! returned to the caller and aborts the run.

use crate::config::IndexerConfig;
use crate::error::{BookIndexError, GenerationError};
use crate::prompts::{page_prompt, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LlmError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// The text returned for one request, with token accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl Annotation {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Response lines, after trimming the whole block.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.trim().lines()
    }
}

/// A text-generation capability: system role + user prompt → free text.
#[async_trait]
pub trait PageAnnotator: Send + Sync {
    /// Provider name used in error messages.
    fn name(&self) -> &str;

    async fn annotate(&self, system: &str, prompt: &str) -> Result<Annotation, GenerationError>;
}

/// [`PageAnnotator`] backed by an `edgequake_llm` provider.
pub struct LlmAnnotator {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmAnnotator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &IndexerConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }
}

#[async_trait]
impl PageAnnotator for LlmAnnotator {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn annotate(&self, system: &str, prompt: &str) -> Result<Annotation, GenerationError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(prompt)];
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| classify_llm_error(&e))?;

        Ok(Annotation {
            content: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

/// Build `CompletionOptions` from the indexer config.
fn build_options(config: &IndexerConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

static RE_RATE_LIMITED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)rate[ _-]?limit|too many requests|\b429\b").unwrap()
});

static RE_UNAUTHORIZED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b40[13]\b|unauthori[sz]ed|invalid api key|incorrect api key|authentication").unwrap()
});

// Quota exhaustion also comes back as HTTP 429 but never clears by waiting.
static RE_QUOTA_EXHAUSTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)quota|billing").unwrap());

/// Map a provider error onto the driver's three outcomes.
///
/// Variants the provider already classified are trusted; free-text
/// variants fall back to [`classify_provider_error`].
pub fn classify_llm_error(err: &LlmError) -> GenerationError {
    let message = err.to_string();
    match err {
        LlmError::RateLimited(detail) if RE_QUOTA_EXHAUSTED.is_match(detail) => {
            GenerationError::Failed(message)
        }
        LlmError::RateLimited(_) => GenerationError::RateLimited(message),
        LlmError::AuthError(_) => GenerationError::Auth(message),
        LlmError::ApiError(_) | LlmError::ProviderError(_) | LlmError::Unknown(_) => {
            classify_provider_error(&message)
        }
        _ => GenerationError::Failed(message),
    }
}

/// Sort a provider error message into the driver's three outcomes.
pub fn classify_provider_error(message: &str) -> GenerationError {
    if RE_QUOTA_EXHAUSTED.is_match(message) {
        GenerationError::Failed(message.to_string())
    } else if RE_RATE_LIMITED.is_match(message) {
        GenerationError::RateLimited(message.to_string())
    } else if RE_UNAUTHORIZED.is_match(message) {
        GenerationError::Auth(message.to_string())
    } else {
        GenerationError::Failed(message.to_string())
    }
}

/// Outcome of [`annotate_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAnnotation {
    pub annotation: Annotation,
    /// Rate-limit pauses taken before the request went through.
    pub rate_limit_waits: u32,
}

/// Request the salient term of one page, pausing and retrying the same page
/// while the service reports rate limiting.
pub async fn annotate_page(
    annotator: &dyn PageAnnotator,
    page: usize,
    page_text: &str,
    config: &IndexerConfig,
) -> Result<PageAnnotation, BookIndexError> {
    let system = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let prompt = page_prompt(
        page_text,
        config.instructions.as_deref(),
        config.focus.as_deref(),
    );

    let mut waits: u32 = 0;
    loop {
        match annotator.annotate(system, &prompt).await {
            Ok(annotation) => {
                debug!(
                    "Page {}: {} input tokens, {} output tokens",
                    page, annotation.input_tokens, annotation.output_tokens
                );
                return Ok(PageAnnotation {
                    annotation,
                    rate_limit_waits: waits,
                });
            }
            Err(GenerationError::RateLimited(detail)) => {
                if config.max_rate_limit_waits.is_some_and(|max| waits >= max) {
                    return Err(BookIndexError::RateLimitExceeded { page, waits });
                }
                waits += 1;
                warn!(
                    "Rate limit exceeded on page {} ({}). Waiting {}s before retrying...",
                    page, detail, config.rate_limit_backoff_secs
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_rate_limited(page, config.rate_limit_backoff_secs);
                }
                sleep(Duration::from_secs(config.rate_limit_backoff_secs)).await;
            }
            Err(other) => return Err(other.into_fatal(page, annotator.name())),
        }
    }
}
