//! Linkscan main entry point
//!
//! This is the command-line interface for the Linkscan broken-link checker.

use anyhow::{bail, Context};
use clap::Parser;
use linkscan::config::{load_config_with_hash, Config};
use linkscan::output::{
    generate_markdown_report, get_report, load_statistics, print_statistics, severity_at_least,
    status_is, ErrorReport,
};
use linkscan::storage::{self, open_storage, share, CrawlJob, ProbeResult, Storage};
use linkscan::Coordinator;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Linkscan: a recursive broken-link checker
///
/// Linkscan crawls a website from a root URL, checks every link it finds,
/// and reports failing links together with the pages that contain them.
#[derive(Parser, Debug)]
#[command(name = "linkscan")]
#[command(version)]
#[command(about = "A recursive broken-link checker", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Page to start crawling from (overrides [scan] root-url)
    #[arg(long, value_name = "URL")]
    root_url: Option<String>,

    /// Attribution stored with the job (overrides [scan] requester)
    #[arg(long, value_name = "ID")]
    requester: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Report links that returned this HTTP status (default: 404)
    #[arg(long, value_name = "CODE", conflicts_with = "min_severity")]
    status: Option<u16>,

    /// Report links at or above this severity (0-3)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(0..=3))]
    min_severity: Option<u8>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Job to inspect with --stats or --export-report (default: latest)
    #[arg(long, value_name = "ID")]
    job: Option<i64>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_report"])]
    dry_run: bool,

    /// Show statistics for a job from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_report"])]
    stats: bool,

    /// Print the report of a stored job and write its markdown export, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_report: bool,
}

type Predicate = Box<dyn Fn(&ProbeResult) -> bool>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, hash)
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            (Config::default(), String::new())
        }
    };

    if cli.dry_run {
        handle_dry_run(&cli, &config)
    } else if cli.stats {
        handle_stats(&cli, &config)
    } else if cli.export_report {
        handle_export_report(&cli, &config)
    } else {
        handle_crawl(&cli, config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so JSON reports on stdout stay parseable.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkscan=info,warn"),
            1 => EnvFilter::new("linkscan=debug,info"),
            2 => EnvFilter::new("linkscan=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn predicate(cli: &Cli) -> Predicate {
    match (cli.status, cli.min_severity) {
        (_, Some(level)) => Box::new(severity_at_least(level)),
        (Some(code), None) => Box::new(status_is(code)),
        (None, None) => Box::new(status_is(404)),
    }
}

fn root_url(cli: &Cli, config: &Config) -> anyhow::Result<String> {
    match cli.root_url.clone().or_else(|| config.scan.root_url.clone()) {
        Some(root) => Ok(root),
        None => bail!("no root URL: pass --root-url or set root-url in the [scan] section"),
    }
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    println!("=== Linkscan Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Page limit: {}", config.crawler.page_limit);
    println!("  Timeout: {}s", config.crawler.timeout_secs);
    println!(
        "  Max concurrent probes: {}",
        config.crawler.max_concurrent_probes
    );
    println!("  Probe flat files: {}", config.crawler.probe_flat_files);
    println!(
        "  Accept invalid certificates when fetching pages: {}",
        config.crawler.accept_invalid_certs_on_fetch
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.value);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Report: {}", config.output.report_path);

    let root = root_url(cli, config)?;
    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", root);

    Ok(())
}

/// Opens the database and resolves the job to inspect
fn open_job(cli: &Cli, config: &Config) -> anyhow::Result<(linkscan::storage::SqliteStorage, CrawlJob)> {
    let storage = open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open {}", config.output.database_path))?;

    let job = match cli.job {
        Some(id) => storage.get_job(id)?,
        None => storage
            .latest_job()?
            .context("no crawl jobs found in database")?,
    };

    Ok((storage, job))
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let (storage, job) = open_job(cli, config)?;
    let stats = load_statistics(&storage, job.id)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_statistics(&stats);
    }

    Ok(())
}

/// Handles the --export-report mode: reports on a stored job
fn handle_export_report(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let (storage, job) = open_job(cli, config)?;
    emit_report(cli, config, &storage, &job)
}

/// Handles the main crawl operation
async fn handle_crawl(cli: &Cli, config: Config, config_hash: &str) -> anyhow::Result<()> {
    let root = root_url(cli, &config)?;
    let requester = cli
        .requester
        .clone()
        .or_else(|| config.scan.requester.clone())
        .unwrap_or_else(|| "cli".to_string());

    let shared = share(
        open_storage(Path::new(&config.output.database_path))
            .with_context(|| format!("failed to open {}", config.output.database_path))?,
    );

    let coordinator = Coordinator::new(config.clone(), shared.clone(), &root, &requester, config_hash)?;

    let token = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight probes");
            token.cancel();
        }
    });

    let job = coordinator.run().await?;
    if job.is_partial() {
        tracing::warn!(
            "Job {} ended with status {}; the report may be incomplete",
            job.id,
            job.status
        );
    }

    let guard = storage::lock(&shared)?;
    emit_report(cli, &config, &*guard, &job)
}

/// Prints the report of a job and writes the markdown export
fn emit_report(
    cli: &Cli,
    config: &Config,
    storage: &dyn Storage,
    job: &CrawlJob,
) -> anyhow::Result<()> {
    let predicate = predicate(cli);
    let report = get_report(storage, job.id, &predicate)?;

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print_report(job, &report);
    }

    let stats = load_statistics(storage, job.id)?;
    let probes = storage.probes_for_job(job.id)?;
    let report_path = Path::new(&config.output.report_path);
    generate_markdown_report(job, &stats, &report, &probes, report_path)
        .with_context(|| format!("failed to write {}", report_path.display()))?;
    tracing::info!("Report written to {}", report_path.display());

    Ok(())
}

fn print_report(job: &CrawlJob, report: &ErrorReport) {
    println!(
        "Job {} ({}): {} pages visited, {} reported links",
        job.id,
        job.status,
        job.pages_visited,
        report.len()
    );

    for (url, sources) in &report.entries {
        println!("\n{}", url);
        if sources.is_empty() {
            println!("  (no referring page)");
        }
        for source in sources {
            println!("  <- {}", source);
        }
    }
}
