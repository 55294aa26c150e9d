//! Binary entry point for newsledger.
//!
//! This binary provides the CLI interface for the article registry.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use newsledger::config::LedgerConfig;
use newsledger::observability;
use newsledger::{
    Admission, ArticleSubmission, AuthenticityScore, ContentFingerprint, EventBus,
    FieldLimits, Publisher, QueryService, Record, RecordId, RegistryService,
};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Newsledger - a dedup-aware, append-only article registry.
#[derive(Parser)]
#[command(name = "newsledger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable metrics and serve them on this port while the command runs.
    #[arg(long, global = true)]
    metrics_port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Submit an article.
    Admit {
        /// Submitter identity.
        #[arg(short, long, env = "NEWSLEDGER_PUBLISHER")]
        publisher: String,

        #[command(flatten)]
        article: ArticleArgs,
    },

    /// Show a record by identifier.
    Get {
        /// Record identifier.
        id: u64,
    },

    /// Check whether content is registered.
    Verify {
        /// Content fingerprint (64 hex chars, optional 0x prefix).
        fingerprint: String,
    },

    /// Check several fingerprints at once.
    BatchVerify {
        /// Content fingerprints.
        #[arg(required = true)]
        fingerprints: Vec<String>,
    },

    /// List records submitted by a publisher.
    List {
        /// Submitter identity.
        #[arg(short, long)]
        publisher: String,

        /// Records to skip.
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Maximum records to show.
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show the most recent records, newest first.
    Recent {
        /// Number of records.
        #[arg(short, default_value = "10")]
        n: usize,
    },

    /// Print the number of admitted records.
    Count,

    /// Compute fingerprints without storing anything.
    Hash {
        #[command(flatten)]
        article: ArticleArgs,
    },

    /// Show registry status.
    Status,
}

/// Article fields, given as flags or as a JSON document.
#[derive(Args)]
struct ArticleArgs {
    /// Read the submission as JSON from this file (`-` for stdin).
    #[arg(long, conflicts_with_all = ["title", "content"])]
    json: Option<PathBuf>,

    /// Headline.
    #[arg(long, required_unless_present = "json")]
    title: Option<String>,

    /// Body text.
    #[arg(long, required_unless_present = "json")]
    content: Option<String>,

    /// Abstract.
    #[arg(long, default_value = "")]
    summary: String,

    /// Originating outlet.
    #[arg(long, default_value = "")]
    source: String,

    /// Canonical URL.
    #[arg(long, default_value = "")]
    link: String,

    /// Tags, as one string.
    #[arg(long, default_value = "")]
    tags: String,

    /// Authenticity score as a fraction (0.85 is stored as 85).
    #[arg(long, default_value = "0")]
    score: f64,
}

impl ArticleArgs {
    fn into_submission(self) -> Result<ArticleSubmission> {
        if let Some(path) = self.json {
            return read_submission(&path);
        }
        Ok(ArticleSubmission::new(
            self.title.unwrap_or_default(),
            self.content.unwrap_or_default(),
            self.summary,
        )
        .with_source(self.source)
        .with_link(self.link)
        .with_tags(self.tags)
        .with_score(AuthenticityScore::from_fraction(self.score)))
    }
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };
    if let Some(port) = cli.metrics_port {
        config.metrics.enabled = true;
        config.metrics = config.metrics.with_port(port);
    }

    let _observability =
        match observability::init(config.observability(cli.verbose, cli.metrics_port.is_some())) {
            Ok(handle) => handle,
            Err(e) => {
                eprintln!("Failed to initialize observability: {e}");
                return ExitCode::FAILURE;
            },
        };

    match run_command(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
///
/// `hash` never opens storage; every other command opens the ledger first.
fn run_command(cli: Cli, config: &LedgerConfig) -> Result<()> {
    let format = cli.format;
    let open_query =
        || -> Result<QueryService> { Ok(QueryService::new(Arc::new(open_registry(config)?))) };

    match cli.command {
        Commands::Hash { article } => cmd_hash(&config.limits, article, format),
        Commands::Admit { publisher, article } => {
            cmd_admit(&open_registry(config)?, &Publisher::new(publisher), article, format)
        },
        Commands::Get { id } => cmd_get(&open_query()?, id, format),
        Commands::Verify { fingerprint } => cmd_verify(&open_query()?, &fingerprint, format),
        Commands::BatchVerify { fingerprints } => {
            cmd_batch_verify(&open_query()?, &fingerprints, format)
        },
        Commands::List {
            publisher,
            offset,
            limit,
        } => cmd_list(&open_query()?, &Publisher::new(publisher), offset, limit, format),
        Commands::Recent { n } => cmd_recent(&open_query()?, n, format),
        Commands::Count => emit(format, &open_query()?.total_count(), |n| println!("{n}")),
        Commands::Status => cmd_status(&open_query()?, config, format),
    }
}

/// Loads configuration.
fn load_config(path: Option<&Path>) -> Result<LedgerConfig> {
    // If a path is provided, load from that file
    if let Some(config_path) = path {
        return Ok(LedgerConfig::load_from_file(config_path)?.apply_env_overrides()?);
    }

    // Environment override for config path
    if let Ok(config_path) = std::env::var("NEWSLEDGER_CONFIG_PATH") {
        if !config_path.trim().is_empty() {
            return Ok(LedgerConfig::load_from_file(Path::new(config_path.trim()))?
                .apply_env_overrides()?);
        }
    }

    // Otherwise, load from default location
    Ok(LedgerConfig::load_default().apply_env_overrides()?)
}

fn open_registry(config: &LedgerConfig) -> Result<RegistryService> {
    let backend = config
        .open_backend()
        .with_context(|| format!("opening {} backend", config.backend.as_str()))?;
    let registry = RegistryService::open(backend)
        .context("replaying ledger")?
        .with_event_bus(EventBus::new(config.event_bus_capacity))
        .with_limits(config.limits);
    Ok(registry)
}

fn read_submission(path: &Path) -> Result<ArticleSubmission> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading submission from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&raw).context("parsing submission JSON")
}

fn parse_fingerprint(s: &str) -> Result<ContentFingerprint> {
    s.parse::<ContentFingerprint>()
        .with_context(|| format!("bad fingerprint '{s}'"))
}

/// Prints `value` as JSON, or through `text` for human output.
fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}

fn format_timestamp(ts: u64) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map_or_else(|| ts.to_string(), |dt| dt.to_rfc3339())
}

fn print_record(record: &Record) {
    println!("Record {}", record.id);
    println!("  Publisher: {}", record.publisher);
    if !record.source.is_empty() {
        println!("  Source: {}", record.source);
    }
    println!("  Admitted: {}", format_timestamp(record.timestamp));
    println!("  Content fingerprint: {}", record.content_fingerprint);
    println!("  Metadata fingerprint: {}", record.metadata_fingerprint);
}

fn print_record_line(record: &Record) {
    println!(
        "  {:>6}  {}  {}  {}",
        record.id,
        format_timestamp(record.timestamp),
        record.publisher,
        record.content_fingerprint
    );
}

/// Admit command.
fn cmd_admit(
    registry: &RegistryService,
    publisher: &Publisher,
    article: ArticleArgs,
    format: OutputFormat,
) -> Result<()> {
    let outcome = registry.admit(publisher, article.into_submission()?)?;

    emit(format, &outcome, |outcome| match outcome {
        Admission::Admitted {
            id,
            content_fingerprint,
            timestamp,
            ..
        } => {
            println!("Article admitted:");
            println!("  ID: {id}");
            println!("  Content fingerprint: {content_fingerprint}");
            println!("  Admitted: {}", format_timestamp(*timestamp));
        },
        Admission::Duplicate {
            existing_id,
            content_fingerprint,
        } => {
            println!("Duplicate of record {existing_id}");
            println!("  Content fingerprint: {content_fingerprint}");
        },
    })
}

/// Get command.
fn cmd_get(query: &QueryService, id: u64, format: OutputFormat) -> Result<()> {
    let record = query.get(RecordId::new(id))?;
    emit(format, &record, print_record)
}

#[derive(Serialize)]
struct Verification {
    exists: bool,
    id: RecordId,
}

/// Verify command.
fn cmd_verify(query: &QueryService, fingerprint: &str, format: OutputFormat) -> Result<()> {
    let (exists, id) = query.verify(&parse_fingerprint(fingerprint)?);
    emit(format, &Verification { exists, id }, |v| {
        if v.exists {
            println!("Registered as record {}", v.id);
        } else {
            println!("Not registered");
        }
    })
}

/// Batch-verify command.
fn cmd_batch_verify(query: &QueryService, fingerprints: &[String], format: OutputFormat) -> Result<()> {
    let parsed = fingerprints
        .iter()
        .map(|s| parse_fingerprint(s))
        .collect::<Result<Vec<_>>>()?;
    let results = query.batch_verify(&parsed);

    emit(format, &results, |results| {
        for (fp, exists) in parsed.iter().zip(results) {
            println!("{fp}  {}", if *exists { "registered" } else { "missing" });
        }
    })
}

/// List command.
fn cmd_list(
    query: &QueryService,
    publisher: &Publisher,
    offset: usize,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    if limit == 0 {
        bail!("--limit must be at least 1");
    }
    let page = query.publisher_page(publisher, offset, limit);

    emit(format, &page, |page| {
        println!(
            "{} record(s) for {publisher}, showing {}..{}:",
            page.total,
            page.offset,
            page.offset + page.records.len()
        );
        page.records.iter().for_each(print_record_line);
    })
}

/// Recent command.
fn cmd_recent(query: &QueryService, n: usize, format: OutputFormat) -> Result<()> {
    let records = query.recent_records(n);
    emit(format, &records, |records| {
        if records.is_empty() {
            println!("No records");
        }
        records.iter().for_each(print_record_line);
    })
}

/// Hash command. Applies the configured field limits, as `admit` does.
fn cmd_hash(limits: &FieldLimits, article: ArticleArgs, format: OutputFormat) -> Result<()> {
    let hashes = limits.article_hashes(article.into_submission()?);

    emit(format, &hashes, |h| {
        println!("Content:  {}", h.content);
        println!("Metadata: {}", h.metadata);
        println!("Combined: {}", h.combined);
        println!("Title:    {}", h.title);
    })
}

/// Status command.
fn cmd_status(query: &QueryService, config: &LedgerConfig, format: OutputFormat) -> Result<()> {
    let status = query.status();

    emit(format, &status, |s| {
        println!("Newsledger Status");
        println!("=================");
        println!();
        println!("Version: {}", env!("CARGO_PKG_VERSION"));
        println!("Backend: {}", s.backend);
        if s.backend == "sqlite" {
            println!("  Path: {}", config.database_path().display());
        }
        println!("Records: {}", s.total_records);
        println!("Publishers: {}", s.publishers);
        if let Some(ts) = s.latest_timestamp {
            println!("Latest: record {} at {}", s.latest_id, format_timestamp(ts));
        }
        println!(
            "Field limits: {}",
            if config.limits.enabled { "enabled" } else { "disabled" }
        );
    })
}
