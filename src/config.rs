//! Configuration types for the indexer and the combiner.
//!
//! Every knob lives in an explicit value passed to the entry points: the
//! library never reads credentials or paths from process-wide state on its
//! own. The CLI resolves flags, environment variables and `.env` into these
//! structs before any work starts.

use crate::error::BookIndexError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Model used when neither the caller nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Configuration for one indexing run over a single PDF.
///
/// Built via [`IndexerConfig::builder()`] or using
/// [`IndexerConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_bookindex::IndexerConfig;
///
/// let config = IndexerConfig::builder()
///     .model("gpt-4.1-mini")
///     .focus("Cloud, Cybersecurity, and Threat Detection")
///     .rate_limit_backoff_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct IndexerConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`] or `EDGEQUAKE_MODEL`.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over everything else.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// OpenAI API key. When set, an OpenAI provider is built with it instead
    /// of letting the provider factory read the environment.
    pub api_key: Option<String>,

    /// Sampling temperature. Default: 0.5.
    pub temperature: f32,

    /// Maximum tokens the model may generate per page. Default: 1024.
    ///
    /// A response is one term and a 5–15 word definition; the limit only
    /// bounds runaway answers.
    pub max_tokens: usize,

    /// Pause before reissuing a rate-limited page, in seconds. Default: 60.
    pub rate_limit_backoff_secs: u64,

    /// Maximum number of rate-limit pauses for a single page. Default: None
    /// (wait as long as the provider keeps asking).
    pub max_rate_limit_waits: Option<u32>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom system role. If None, uses [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Custom per-page instructions. The page text is appended after them.
    /// If None, uses the built-in indexing instructions.
    pub instructions: Option<String>,

    /// Subject area the terms should relate to, e.g. "Cloud Security".
    pub focus: Option<String>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// How page ordinals are rendered in the exported table. Default: zero-based.
    pub numbering: PageNumbering,

    /// Receives per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            api_key: None,
            temperature: 0.5,
            max_tokens: 1024,
            rate_limit_backoff_secs: 60,
            max_rate_limit_waits: None,
            password: None,
            system_prompt: None,
            instructions: None,
            focus: None,
            pages: PageSelection::default(),
            numbering: PageNumbering::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for IndexerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexerConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("rate_limit_backoff_secs", &self.rate_limit_backoff_secs)
            .field("max_rate_limit_waits", &self.max_rate_limit_waits)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("focus", &self.focus)
            .field("pages", &self.pages)
            .field("numbering", &self.numbering)
            .finish()
    }
}

impl IndexerConfig {
    /// Create a new builder for `IndexerConfig`.
    pub fn builder() -> IndexerConfigBuilder {
        IndexerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`IndexerConfig`].
#[derive(Debug)]
pub struct IndexerConfigBuilder {
    config: IndexerConfig,
}

impl IndexerConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn rate_limit_backoff_secs(mut self, secs: u64) -> Self {
        self.config.rate_limit_backoff_secs = secs;
        self
    }

    pub fn max_rate_limit_waits(mut self, n: u32) -> Self {
        self.config.max_rate_limit_waits = Some(n);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn instructions(mut self, text: impl Into<String>) -> Self {
        self.config.instructions = Some(text.into());
        self
    }

    pub fn focus(mut self, focus: impl Into<String>) -> Self {
        self.config.focus = Some(focus.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn numbering(mut self, numbering: PageNumbering) -> Self {
        self.config.numbering = numbering;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<IndexerConfig, BookIndexError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(BookIndexError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(BookIndexError::InvalidConfig(
                "API key is set but empty".into(),
            ));
        }
        if c.api_key.is_some() {
            if let Some(name) = c.provider_name.as_deref() {
                if !name.eq_ignore_ascii_case("openai") {
                    return Err(BookIndexError::InvalidConfig(format!(
                        "an explicit API key is only used with the openai provider, not '{name}'; \
                         set the provider's own key variable instead"
                    )));
                }
            }
        }
        if let PageSelection::Range(start, end) = c.pages {
            if start > end {
                return Err(BookIndexError::InvalidConfig(format!(
                    "page range {start}-{end}: start must be <= end"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Combiner ─────────────────────────────────────────────────────────────

/// Where the combiner finds its source tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceSet {
    /// `<dir>/<prefix><i>.csv` for `i = 1..=count`.
    Numbered {
        dir: PathBuf,
        prefix: String,
        count: usize,
    },
    /// An explicit, ordered list of tables. Book `B{i}` is the i-th path.
    Explicit(Vec<PathBuf>),
}

impl SourceSet {
    /// Expand into the ordered list of source table paths.
    pub fn paths(&self) -> Vec<PathBuf> {
        match self {
            SourceSet::Numbered { dir, prefix, count } => (1..=*count)
                .map(|i| dir.join(format!("{prefix}{i}.csv")))
                .collect(),
            SourceSet::Explicit(paths) => paths.clone(),
        }
    }
}

/// Configuration for a combiner run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineConfig {
    /// The ordered source tables.
    pub sources: SourceSet,
    /// Destination of the composite table.
    pub output: PathBuf,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            sources: SourceSet::Numbered {
                dir: PathBuf::from("."),
                prefix: "SEC588".to_string(),
                count: 5,
            },
            output: PathBuf::from("GPCS_Composite.csv"),
        }
    }
}

impl CombineConfig {
    /// Create a new builder for `CombineConfig`.
    pub fn builder() -> CombineConfigBuilder {
        CombineConfigBuilder {
            dir: PathBuf::from("."),
            prefix: "SEC588".to_string(),
            count: 5,
            explicit: Vec::new(),
            output: PathBuf::from("GPCS_Composite.csv"),
        }
    }
}

/// Builder for [`CombineConfig`].
///
/// Explicit sources added with [`CombineConfigBuilder::source`] replace the
/// numbered `<prefix><i>.csv` scheme entirely.
#[derive(Debug)]
pub struct CombineConfigBuilder {
    dir: PathBuf,
    prefix: String,
    count: usize,
    explicit: Vec<PathBuf>,
    output: PathBuf,
}

impl CombineConfigBuilder {
    pub fn dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn count(mut self, n: usize) -> Self {
        self.count = n;
        self
    }

    pub fn source(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit.push(path.as_ref().to_path_buf());
        self
    }

    pub fn output(mut self, path: impl AsRef<Path>) -> Self {
        self.output = path.as_ref().to_path_buf();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CombineConfig, BookIndexError> {
        let sources = if self.explicit.is_empty() {
            if self.count == 0 {
                return Err(BookIndexError::InvalidConfig(
                    "combiner needs at least one source table".into(),
                ));
            }
            SourceSet::Numbered {
                dir: self.dir,
                prefix: self.prefix,
                count: self.count,
            }
        } else {
            SourceSet::Explicit(self.explicit)
        };
        Ok(CombineConfig {
            sources,
            output: self.output,
        })
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the PDF to index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Index all pages (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let in_range = |p: &usize| *p >= 1 && *p <= total_pages;
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if in_range(p) {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages.iter().filter(|p| in_range(*p)).map(|p| p - 1).collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

/// How page ordinals are written to the index table.
///
/// Ordinals are always recorded zero-based; numbering only affects export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageNumbering {
    /// First page is `0` (default).
    #[default]
    ZeroBased,
    /// First page is `1`, matching printed page counters.
    OneBased,
}

impl PageNumbering {
    /// Render a zero-based ordinal under this numbering scheme.
    pub fn render(self, ordinal: usize) -> usize {
        match self {
            PageNumbering::ZeroBased => ordinal,
            PageNumbering::OneBased => ordinal + 1,
        }
    }
}
