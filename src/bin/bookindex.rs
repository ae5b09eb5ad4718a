//! CLI binary for edgequake-bookindex.
//!
//! A thin shim over the library crate: `build` maps flags to
//! `IndexerConfig`, `combine` maps flags to `CombineConfig`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_bookindex::{
    build_index_to_file, combine_to_file, CombineConfig, IndexProgressCallback, IndexerConfig,
    PageNumbering, PageSelection, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a bar over the selected pages plus one log
/// line per page and per rate-limit pause.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_run_start
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Extracting text…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl IndexProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Indexing");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Prompting for {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page: usize, _total_pages: usize) {
        self.bar.set_message(format!("page {page}"));
    }

    fn on_rate_limited(&self, page: usize, wait_secs: u64) {
        self.bar.println(format!(
            "  {} Page {:>3}  rate limited, retrying in {}s",
            yellow("…"),
            page,
            wait_secs
        ));
    }

    fn on_page_complete(&self, page: usize, _total_pages: usize, new_terms: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}  {}",
            green("✓"),
            page,
            dim(&format!("{new_terms} new terms")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_pages: usize, distinct_terms: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} terms from {} pages",
            green("✔"),
            bold(&distinct_terms.to_string()),
            total_pages
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Index one book
  bookindex build book1.pdf -o SEC5881.csv

  # Encrypted PDF, password from the environment (or .env)
  PDF_PASSWORD=secret bookindex build book2.pdf -o SEC5882.csv

  # Steer terms toward a subject, index only chapter pages
  bookindex build --focus "Cloud, Cybersecurity, and Threat Detection" --pages 5-120 book.pdf

  # Merge SEC5881.csv … SEC5885.csv into GPCS_Composite.csv
  bookindex combine --prefix SEC588 --count 5 -o GPCS_Composite.csv

  # Merge an explicit list of tables (B1, B2, … in the given order)
  bookindex combine --input intro.csv --input advanced.csv -o all.csv

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDF_PASSWORD            Password of encrypted PDFs
  PDFIUM_LIB_PATH         Path to the pdfium shared library

A `.env` file in the working directory is loaded before flags are parsed.
"#;

/// Build back-of-book term indices from PDFs with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "bookindex",
    version,
    about = "Build back-of-book term indices from PDFs with an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "BOOKINDEX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "BOOKINDEX_QUIET")]
    quiet: bool,

    /// Print run statistics as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index one PDF into a Term,Pages,Definition table.
    Build(BuildArgs),
    /// Merge per-book tables into a Term,Book,Page,Definition table.
    Combine(CombineArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Local PDF file path.
    #[arg(env = "BOOKINDEX_PDF")]
    input: PathBuf,

    /// Output CSV path.
    #[arg(short, long, env = "BOOKINDEX_OUTPUT", default_value = "index.csv")]
    output: PathBuf,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// OpenAI API key. Without it, provider keys are read from the
    /// environment (OPENAI_API_KEY, ANTHROPIC_API_KEY, ...).
    #[arg(long)]
    api_key: Option<String>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7 (1-indexed).
    #[arg(long, env = "BOOKINDEX_PAGES", default_value = "all")]
    pages: String,

    /// Subject the terms should relate to.
    #[arg(long, env = "BOOKINDEX_FOCUS")]
    focus: Option<String>,

    /// Path to a text file with a custom system role.
    #[arg(long, env = "BOOKINDEX_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Path to a text file with custom per-page instructions.
    #[arg(long, env = "BOOKINDEX_INSTRUCTIONS")]
    instructions: Option<PathBuf>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "BOOKINDEX_TEMPERATURE", default_value_t = 0.5)]
    temperature: f32,

    /// Max LLM output tokens per page.
    #[arg(long, env = "BOOKINDEX_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// Seconds to wait before retrying a rate-limited page.
    #[arg(long, env = "BOOKINDEX_BACKOFF_SECS", default_value_t = 60)]
    backoff_secs: u64,

    /// Give up after this many rate-limit waits on one page (default: never).
    #[arg(long, env = "BOOKINDEX_MAX_RATE_LIMIT_WAITS")]
    max_rate_limit_waits: Option<u32>,

    /// Write page numbers starting at 1 instead of 0.
    #[arg(long, env = "BOOKINDEX_ONE_BASED")]
    one_based: bool,

    /// Disable progress bar.
    #[arg(long, env = "BOOKINDEX_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct CombineArgs {
    /// Directory holding the numbered source tables.
    #[arg(long, env = "BOOKINDEX_COMBINE_DIR", default_value = ".")]
    dir: PathBuf,

    /// File-name prefix of the numbered source tables.
    #[arg(long, env = "BOOKINDEX_COMBINE_PREFIX", default_value = "SEC588")]
    prefix: String,

    /// Number of numbered source tables (<prefix>1.csv … <prefix>N.csv).
    #[arg(long, env = "BOOKINDEX_COMBINE_COUNT", default_value_t = 5)]
    count: usize,

    /// Explicit source tables, in book order. Overrides --dir/--prefix/--count.
    #[arg(long = "input", value_name = "CSV")]
    inputs: Vec<PathBuf>,

    /// Output CSV path.
    #[arg(short, long, env = "BOOKINDEX_COMBINE_OUTPUT", default_value = "GPCS_Composite.csv")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so clap's env fallbacks see its values.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs while it is on screen.
    let show_progress = match &cli.command {
        Command::Build(args) => !cli.quiet && !args.no_progress && !cli.json,
        Command::Combine(_) => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Build(args) => run_build(&cli, args, show_progress).await,
        Command::Combine(args) => run_combine(&cli, args),
    }
}

async fn run_build(cli: &Cli, args: &BuildArgs, show_progress: bool) -> Result<()> {
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn IndexProgressCallback>)
    } else {
        None
    };

    let config = build_config(args, progress).await?;

    let stats = build_index_to_file(&args.input, &args.output, &config)
        .await
        .context("Indexing failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} terms  {}/{} pages  {}ms  →  {}",
            green("✔"),
            stats.distinct_terms,
            stats.processed_pages,
            stats.total_pages,
            stats.total_duration_ms,
            bold(&args.output.display().to_string()),
        );
        if stats.partial_lines > 0 || stats.rate_limit_waits > 0 {
            eprintln!(
                "   {} partial matches  /  {} rate-limit waits",
                dim(&stats.partial_lines.to_string()),
                dim(&stats.rate_limit_waits.to_string()),
            );
        }
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&stats.total_input_tokens.to_string()),
            dim(&stats.total_output_tokens.to_string()),
        );
    }

    Ok(())
}

fn run_combine(cli: &Cli, args: &CombineArgs) -> Result<()> {
    let mut builder = CombineConfig::builder()
        .dir(&args.dir)
        .prefix(args.prefix.clone())
        .count(args.count)
        .output(&args.output);
    for input in &args.inputs {
        builder = builder.source(input);
    }
    let config = builder.build().context("Invalid configuration")?;

    let stats = combine_to_file(&config).context("Combining failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} rows from {} books  →  {}",
            green("✔"),
            stats.total_rows,
            stats.books,
            bold(&args.output.display().to_string()),
        );
    }
    Ok(())
}

/// Map CLI args to `IndexerConfig`.
async fn build_config(args: &BuildArgs, progress: Option<ProgressCallback>) -> Result<IndexerConfig> {
    let mut builder = IndexerConfig::builder()
        .pages(parse_pages(&args.pages)?)
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .rate_limit_backoff_secs(args.backoff_secs)
        .numbering(if args.one_based {
            PageNumbering::OneBased
        } else {
            PageNumbering::ZeroBased
        });

    if let Some(ref model) = args.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref key) = args.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref focus) = args.focus {
        builder = builder.focus(focus.clone());
    }
    if let Some(n) = args.max_rate_limit_waits {
        builder = builder.max_rate_limit_waits(n);
    }
    if let Some(ref path) = args.system_prompt {
        builder = builder.system_prompt(read_text(path).await?);
    }
    if let Some(ref path) = args.instructions {
        builder = builder.instructions(read_text(path).await?);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read prompt text from {:?}", path))
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pages_forms() {
        assert_eq!(parse_pages("all").unwrap(), PageSelection::All);
        assert_eq!(parse_pages(" 5 ").unwrap(), PageSelection::Single(5));
        assert_eq!(parse_pages("3-15").unwrap(), PageSelection::Range(3, 15));
        assert_eq!(
            parse_pages("1,3,5").unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
    }

    #[test]
    fn parse_pages_rejects_zero_and_reversed() {
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("0-3").is_err());
        assert!(parse_pages("9-3").is_err());
        assert!(parse_pages("1,0").is_err());
        assert!(parse_pages("abc").is_err());
    }

    #[test]
    fn cli_parses_build_and_combine() {
        let cli = Cli::try_parse_from(["bookindex", "build", "book.pdf", "-o", "out.csv", "--one-based"])
            .unwrap();
        match cli.command {
            Command::Build(args) => {
                assert_eq!(args.input, PathBuf::from("book.pdf"));
                assert_eq!(args.output, PathBuf::from("out.csv"));
                assert!(args.one_based);
            }
            other => panic!("unexpected: {other:?}"),
        }

        let cli = Cli::try_parse_from([
            "bookindex", "combine", "--input", "a.csv", "--input", "b.csv",
        ])
        .unwrap();
        match cli.command {
            Command::Combine(args) => assert_eq!(args.inputs.len(), 2),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn openai_key_in_env_does_not_override_provider_pair() {
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("EDGEQUAKE_LLM_PROVIDER", "anthropic");
        std::env::set_var("EDGEQUAKE_MODEL", "claude-3-5-haiku-latest");

        let cli = Cli::try_parse_from(["bookindex", "build", "book.pdf"]).unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        let config = build_config(&args, None).await.unwrap();

        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("EDGEQUAKE_LLM_PROVIDER");
        std::env::remove_var("EDGEQUAKE_MODEL");

        assert!(args.api_key.is_none());
        assert!(config.api_key.is_none());
        assert!(config.provider_name.is_none());
    }

    #[tokio::test]
    async fn explicit_api_key_flag_is_kept() {
        let cli =
            Cli::try_parse_from(["bookindex", "build", "book.pdf", "--api-key", "sk-flag"]).unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        let config = build_config(&args, None).await.unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-flag"));
    }
}
