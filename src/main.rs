//! checkurl CLI
//!
//! Checks reachability of a list of URLs and captures a headless Chrome
//! screenshot of each reachable one into a single HTML report.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use checkurl::check_urls::{expand_long_flags, run_check_urls, CheckUrlsArgs};

#[derive(Parser)]
#[command(name = "checkurl")]
#[command(author = "RoyalBit Inc.")]
#[command(version)]
#[command(about = "Check URL accessibility and capture screenshots with headless Chrome")]
#[command(long_about = "Reads a list of URLs from a file, checks their accessibility,\ncaptures screenshots, and generates an HTML report with the results.\n\nThe report includes the URL, title, status code, and screenshot for each\naccessible URL, as well as a list of inaccessible URLs.\n\nExample:\n  checkurl --file urls.txt --concurrency 8")]
struct Cli {
    #[command(flatten)]
    check: CheckUrlsArgs,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_from(expand_long_flags(std::env::args()));
    setup_logging(cli.verbose, cli.quiet);

    eprintln!("URL Checker v{}", env!("CARGO_PKG_VERSION"));
    run_check_urls(cli.check).await
}

/// Logs go to stderr; stdout is reserved for the JSON summary
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("checkurl=info,warn"),
                1 => EnvFilter::new("checkurl=debug,info"),
                2 => EnvFilter::new("checkurl=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
