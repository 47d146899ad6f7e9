//! check command: probe a URL list, capture screenshots, write the report
//!
//! Compact JSON summary on stdout, progress on stderr.

use crate::browser::ChromeCapturer;
use crate::cleanup::kill_browser_processes;
use crate::input::read_url_file;
use crate::model::{UrlResult, UrlTask};
use crate::probe::HttpProber;
use crate::report::{render_html, write_report};
use crate::retry::{RetryController, RetryPolicy, TokioSleeper};
use crate::scheduler::run_all;
use crate::summary::Summary;
use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug)]
pub struct CheckUrlsArgs {
    /// File containing URLs, one per line (UTF-8 or UTF-16 with BOM)
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Number of URLs processed at once (1-64)
    #[arg(short, long, default_value = "4", value_parser = clap::value_parser!(u16).range(1..=64))]
    pub concurrency: u16,

    /// Deadline per attempt, e.g. 180s, 3m, 500ms (bare numbers are seconds)
    #[arg(short, long, default_value = "180s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Attempts per URL before giving up (1-20)
    #[arg(short = 'r', long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: u32,

    /// HTML report destination
    #[arg(short, long, default_value = "results.html")]
    pub output: PathBuf,

    /// Kill all Chrome processes once the batch has finished
    #[arg(long)]
    pub cleanup_browser: bool,
}

/// Configuration for a check run
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub concurrency: usize,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout: Duration::from_secs(180),
            max_retries: 3,
        }
    }
}

/// Finished batch: every result plus the derived counts
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub summary: Summary,
    pub results: Vec<UrlResult>,
}

/// Run the check command
pub async fn run_check_urls(args: CheckUrlsArgs) -> Result<()> {
    let Some(file) = &args.file else {
        eprintln!("Usage:");
        eprintln!("  checkurl --file <urls.txt> [--concurrency 4] [--timeout 180s] [--max-retries 3]");
        std::process::exit(1);
    };

    let urls = read_url_file(file)
        .await
        .with_context(|| format!("Failed to load URL list from {}", file.display()))?;

    eprintln!(
        "Checking {} URLs ({} parallel, {} attempts each)...",
        urls.len(),
        args.concurrency,
        args.max_retries
    );

    let config = CheckConfig {
        concurrency: usize::from(args.concurrency),
        timeout: args.timeout,
        max_retries: args.max_retries,
    };

    let report = check_urls(urls, &config).await?;

    let html = render_html(&report.results, &report.summary, Local::now());
    write_report(&args.output, &html)
        .await
        .with_context(|| format!("Failed to save HTML report: {}", args.output.display()))?;
    info!("Results saved to {}", args.output.display());

    if args.cleanup_browser {
        kill_browser_processes().await;
    }

    println!("{}", serde_json::to_string(&report.summary)?);

    eprintln!(
        "Done: {}/{} accessible",
        report.summary.accessible, report.summary.total
    );

    Ok(())
}

/// Check every URL with the HTTP prober and headless Chrome
pub async fn check_urls(urls: Vec<String>, config: &CheckConfig) -> Result<CheckReport> {
    let prober = HttpProber::new().context("Failed to build HTTP client")?;
    let controller = RetryController::new(
        Arc::new(prober),
        Arc::new(ChromeCapturer::new()),
        Arc::new(TokioSleeper),
        RetryPolicy::new(config.max_retries, config.timeout),
    );

    Ok(check_with(urls, config.concurrency, Arc::new(controller)).await)
}

/// Schedule `urls` through an already assembled controller
pub async fn check_with(
    urls: Vec<String>,
    concurrency: usize,
    controller: Arc<RetryController>,
) -> CheckReport {
    let tasks = UrlTask::from_lines(urls);
    let results = run_all(tasks, concurrency, controller).await;
    let summary = Summary::from_results(&results);

    info!(
        total = summary.total,
        accessible = summary.accessible,
        inaccessible = summary.inaccessible,
        redirected = summary.redirected,
        "Batch complete"
    );

    CheckReport { summary, results }
}

/// Long options that may also be spelled with a single dash (`-file urls.txt`)
const LONG_FLAGS: &[&str] = &[
    "file",
    "concurrency",
    "timeout",
    "max-retries",
    "output",
    "cleanup-browser",
    "verbose",
    "quiet",
    "help",
    "version",
];

/// Rewrite `-file`/`-file=x` style arguments to their `--` form
///
/// Short clusters such as `-f` or `-vv` are left alone, as is everything
/// after a bare `--`.
pub fn expand_long_flags<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(|arg| {
            if passthrough || arg == "--" {
                passthrough = true;
                return arg;
            }
            let Some(rest) = arg.strip_prefix('-').filter(|r| !r.starts_with('-')) else {
                return arg;
            };
            let name = rest.split_once('=').map_or(rest, |(name, _)| name);
            if LONG_FLAGS.contains(&name) {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}

/// Parse `500ms`, `30s`, `3m`, `1h`, or bare seconds
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (number, unit) = s.split_at(split);

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration '{}'", s))?;

    match unit.trim() {
        "ms" => Ok(Duration::from_millis(value)),
        "" | "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 3600)),
        other => Err(format!("unknown duration unit '{}' (use ms, s, m or h)", other)),
    }
}
