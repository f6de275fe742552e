//! CORS Probe CLI Application
//!
//! Reads URLs (one per line) from a file or standard input, probes each with
//! crafted `Origin` headers and prints `<url> <origin>` for every URL whose
//! server reflects one of them.

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use console::style;
use cors_probe_lib::{open_input, CheckConfig, CorsChecker, FileConfig, Finding};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Single-dash long flags accepted for compatibility, with their canonical form.
const LEGACY_FLAGS: &[(&str, &str)] = &[("-cookies", "--cookies")];

/// CLI arguments for cors-probe
#[derive(Parser, Debug)]
#[command(name = "cors-probe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find URLs that reflect crafted Origin headers in Access-Control-Allow-Origin")]
#[command(
    long_about = "Find URLs that reflect crafted Origin headers in Access-Control-Allow-Origin.\n\nEach URL is requested with up to five crafted origins; the first one the server trusts is printed as '<url> <origin>'."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Path to a list of URLs, one per line (reads stdin if omitted)
    #[arg(short = 'f', long = "file", value_name = "FILE", help_heading = "Input")]
    pub file: Option<PathBuf>,

    /// Domain name substituted into the crafted origins
    #[arg(short = 'd', long = "domain", value_name = "DOMAIN", help_heading = "Probe")]
    pub domain: Option<String>,

    /// Cookies to send with every request
    #[arg(long = "cookies", value_name = "COOKIES", help_heading = "Probe")]
    pub cookies: Option<String>,

    /// Number of concurrent workers [default: 10]
    #[arg(short = 'c', long = "concurrency", value_name = "N", value_parser = clap::value_parser!(u64).range(1..), help_heading = "Performance")]
    pub concurrency: Option<u64>,

    /// Per-request timeout in seconds, 0 for none [default: 5]
    #[arg(short = 't', long = "timeout", value_name = "SECONDS", help_heading = "Performance")]
    pub timeout: Option<u64>,

    /// Load default values from a TOML config file
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,

    /// Log skipped URLs, failed requests and a scan summary to stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse_from(normalize_legacy_flags(std::env::args()));

    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        process::exit(1);
    }
}

/// Rewrite single-dash long flags (`-cookies`) into their `--` form.
fn normalize_legacy_flags<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| {
            for (legacy, canonical) in LEGACY_FLAGS {
                if arg == *legacy {
                    return canonical.to_string();
                }
                if let Some(value) = arg.strip_prefix(&format!("{}=", legacy)) {
                    return format!("{}={}", canonical, value);
                }
            }
            arg
        })
        .collect()
}

/// Install a stderr subscriber. Stdout is reserved for findings.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::new(format!("cors_probe={level},cors_probe_lib={level}"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;
    tracing::debug!(
        concurrency = config.concurrency,
        timeout = ?config.timeout,
        domain = %config.domain,
        "starting scan"
    );

    let input = open_input(args.file.as_deref()).await?;
    let checker = CorsChecker::with_config(config)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_findings(rx, io::stdout()));

    let summary = checker.scan(input, tx).await;
    printer.await??;

    tracing::debug!(
        lines = summary.lines_read,
        processed = summary.urls_processed,
        findings = summary.findings,
        "done"
    );
    Ok(())
}

/// Write each finding as one line to `out`.
///
/// A closed pipe (`cors-probe ... | head`) stops printing without an error;
/// the scan itself still runs to completion.
async fn print_findings<W: Write>(
    mut rx: mpsc::UnboundedReceiver<Finding>,
    mut out: W,
) -> io::Result<()> {
    while let Some(finding) = rx.recv().await {
        if let Err(e) = writeln!(out, "{}", finding).and_then(|_| out.flush()) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                tracing::debug!("stdout closed, no longer printing findings");
                return Ok(());
            }
            return Err(e);
        }
    }
    Ok(())
}

/// Build CheckConfig from CLI arguments and an optional config file.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments
/// 2. Config file given with --config
/// 3. Built-in defaults
fn build_config(args: &Args) -> Result<CheckConfig, Box<dyn std::error::Error>> {
    let mut config = CheckConfig::default();

    if let Some(path) = &args.config {
        let file_config = FileConfig::load(path)?;
        config = file_config.apply_to(config);
    }

    Ok(apply_cli_args_to_config(config, args))
}

fn apply_cli_args_to_config(mut config: CheckConfig, args: &Args) -> CheckConfig {
    if let Some(domain) = &args.domain {
        config = config.with_domain(domain.clone());
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(usize::try_from(concurrency).unwrap_or(usize::MAX));
    }
    if let Some(timeout) = args.timeout {
        config = config.with_timeout(Duration::from_secs(timeout));
    }
    if let Some(cookies) = &args.cookies {
        config = config.with_cookies(cookies.clone());
    }
    config
}
