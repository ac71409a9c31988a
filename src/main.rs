//! Linkprobe command-line interface
//!
//! Checks one or more locations for broken links and reports the results
//! as text, JSON, or CSV. Exit code 0 means every link resolved, 1 means
//! at least one link is broken, and any other failure (bad options,
//! missing seed path) exits non-zero before crawling.

use clap::{Parser, ValueEnum};
use linkprobe::config::{load_config, validate, CheckOptions, LinksToSkip, UrlRewriteRule};
use linkprobe::output::{format_link_line, write_csv, write_json, write_summary};
use linkprobe::{ConfigError, LinkChecker, ProbeError};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Default configuration file probed when `--config` is not given
const DEFAULT_CONFIG_FILE: &str = "linkinator.config.json";

#[derive(Parser, Debug)]
#[command(name = "linkprobe")]
#[command(version)]
#[command(about = "Find broken links in websites and local documentation trees")]
struct Cli {
    /// URLs or local paths to check
    #[arg(value_name = "LOCATION", required = true, num_args = 1..)]
    location: Vec<String>,

    /// Maximum number of in-flight requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// Path to a JSON config file (defaults to linkinator.config.json)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serve generated index pages for directories
    #[arg(long)]
    directory_listing: bool,

    /// Output format
    #[arg(long, value_enum, ignore_case = true)]
    format: Option<Format>,

    /// Treat Markdown files as crawlable documents
    #[arg(long)]
    markdown: bool,

    /// Follow links on the same root origin as the seed
    #[arg(short, long)]
    recurse: bool,

    /// Retry 429 responses that carry a retry-after header
    #[arg(long)]
    retry: bool,

    /// Retry 429 responses without a retry-after header
    #[arg(long)]
    retry_no_header: bool,

    /// Retry budget for no-header 429s; -1 retries until success
    #[arg(long, value_name = "COUNT")]
    retry_no_header_count: Option<i64>,

    /// Delay between no-header 429 retries, in milliseconds
    #[arg(long, value_name = "MS")]
    retry_no_header_delay: Option<u64>,

    /// Retry 5xx responses and network errors with exponential backoff
    #[arg(long)]
    retry_errors: bool,

    /// Retry budget for 5xx/network errors
    #[arg(long, value_name = "COUNT")]
    retry_errors_count: Option<u32>,

    /// Jitter bound added to the error backoff, in milliseconds
    #[arg(long, value_name = "MS")]
    retry_errors_jitter: Option<u64>,

    /// Filesystem root for the static server
    #[arg(long, value_name = "DIR")]
    server_root: Option<PathBuf>,

    /// Suppress per-link progress output
    #[arg(long, conflicts_with = "verbosity")]
    silent: bool,

    /// Regex patterns for links to skip (whitespace/comma separated, repeatable)
    #[arg(short, long = "skip", value_name = "PATTERN")]
    skip: Vec<String>,

    /// Per-request timeout in milliseconds; 0 disables the deadline
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Regex applied to every URL before checking
    #[arg(long, value_name = "PATTERN", requires = "url_rewrite_replace")]
    url_rewrite_search: Option<String>,

    /// Replacement for --url-rewrite-search matches
    #[arg(long, value_name = "REPLACEMENT", requires = "url_rewrite_search")]
    url_rewrite_replace: Option<String>,

    /// Request User-Agent
    #[arg(long, value_name = "AGENT")]
    user_agent: Option<String>,

    /// Log verbosity
    #[arg(long, value_enum)]
    verbosity: Option<Verbosity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Verbosity {
    Debug,
    Info,
    Warning,
    Error,
    None,
}

impl Verbosity {
    fn parse_config_value(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "none" => Ok(Self::None),
            other => Err(ConfigError::Validation(format!(
                "invalid verbosity '{other}'"
            ))),
        }
    }

    fn env_filter(self) -> EnvFilter {
        match self {
            Self::Debug => EnvFilter::new("linkprobe=debug,info"),
            Self::Info => EnvFilter::new("linkprobe=info,warn"),
            Self::Warning => EnvFilter::new("warn"),
            Self::Error => EnvFilter::new("error"),
            Self::None => EnvFilter::new("off"),
        }
    }
}

fn parse_config_format(value: &str) -> Result<Format, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "text" => Ok(Format::Text),
        "json" => Ok(Format::Json),
        "csv" => Ok(Format::Csv),
        other => Err(ConfigError::Validation(format!("invalid format '{other}'"))),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> Result<bool, ProbeError> {
    let mut options = CheckOptions::default();

    // Defaults, then the config file, then CLI flags on top
    let mut format = Format::Text;
    let mut silent = false;
    let mut verbosity = Verbosity::Warning;

    if let Some(raw) = load_config_file(cli.config.as_deref())? {
        raw.apply_to(&mut options)?;
        if let Some(value) = &raw.format {
            format = parse_config_format(value)?;
        }
        if let Some(value) = raw.silent {
            silent = value;
        }
        if let Some(value) = &raw.verbosity {
            verbosity = Verbosity::parse_config_value(value)?;
        }
    }

    apply_cli_overrides(&cli, &mut options)?;
    if let Some(value) = cli.format {
        format = value;
    }
    if cli.silent {
        silent = true;
    }
    if let Some(value) = cli.verbosity {
        verbosity = value;
    }

    setup_logging(verbosity, silent);
    validate(&options)?;

    let mut checker = LinkChecker::new();
    if format == Format::Text && !silent {
        checker.on_link(|link| println!("{}", format_link_line(link)));
    }

    tracing::info!(
        "checking {} location(s) with concurrency {}",
        options.path.len(),
        options.concurrency
    );
    let result = checker.check(options).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let written = match format {
        Format::Text => write_summary(&mut out, &result),
        Format::Json => write_json(&mut out, &result),
        Format::Csv => write_csv(&mut out, &result),
    };
    if let Err(e) = written {
        tracing::error!("failed to write output: {e}");
    }

    Ok(result.passed)
}

/// Loads `--config` (must exist when given) or the default file (optional)
fn load_config_file(
    explicit: Option<&Path>,
) -> Result<Option<linkprobe::config::RawConfig>, ConfigError> {
    match explicit {
        Some(path) => load_config(path).map(Some),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                load_config(default).map(Some)
            } else {
                Ok(None)
            }
        }
    }
}

fn apply_cli_overrides(cli: &Cli, options: &mut CheckOptions) -> Result<(), ConfigError> {
    options.path = cli.location.clone();

    if let Some(concurrency) = cli.concurrency {
        options.concurrency = concurrency;
    }
    if let Some(timeout) = cli.timeout {
        options.timeout = timeout;
    }
    if cli.recurse {
        options.recurse = true;
    }
    if cli.markdown {
        options.markdown = true;
    }
    if cli.directory_listing {
        options.directory_listing = true;
    }
    if let Some(root) = &cli.server_root {
        options.server_root = Some(root.clone());
    }
    if cli.retry {
        options.retry = true;
    }
    if cli.retry_no_header {
        options.retry_no_header = true;
    }
    if let Some(count) = cli.retry_no_header_count {
        options.retry_no_header_count = count;
    }
    if let Some(delay) = cli.retry_no_header_delay {
        options.retry_no_header_delay = delay;
    }
    if cli.retry_errors {
        options.retry_errors = true;
    }
    if let Some(count) = cli.retry_errors_count {
        options.retry_errors_count = count;
    }
    if let Some(jitter) = cli.retry_errors_jitter {
        options.retry_errors_jitter = jitter;
    }
    if let Some(agent) = &cli.user_agent {
        options.user_agent = Some(agent.clone());
    }

    if !cli.skip.is_empty() {
        options.links_to_skip = LinksToSkip::Patterns(split_skip_patterns(&cli.skip));
    }

    if let (Some(search), Some(replace)) = (&cli.url_rewrite_search, &cli.url_rewrite_replace) {
        let pattern = Regex::new(search).map_err(|e| ConfigError::InvalidRegex {
            pattern: search.clone(),
            message: e.to_string(),
        })?;
        options.url_rewrites.push(UrlRewriteRule {
            pattern,
            replacement: replace.clone(),
        });
    }

    Ok(())
}

/// Splits repeated `--skip` values on whitespace and commas
fn split_skip_patterns(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|value| value.split([',', ' ', '\t', '\n']))
        .filter(|pattern| !pattern.is_empty())
        .map(str::to_string)
        .collect()
}

fn setup_logging(verbosity: Verbosity, silent: bool) {
    let filter = if silent {
        EnvFilter::new("error")
    } else {
        verbosity.env_filter()
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
