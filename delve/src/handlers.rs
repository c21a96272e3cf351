use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use delve_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl, parse_delay};
use delve_core::report::{ReportFormat, render_report, save_report};
use delve_crawler::{CancellationToken, CrawlSummary};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_INTERRUPTED: i32 = 130;

/// Parse a seed URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    // Try to parse as-is
    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(line.to_string());
    }

    // Try adding http://
    let with_scheme = format!("http://{}", line);
    if let Ok(url) = Url::parse(&with_scheme)
        && url.has_host()
    {
        return Some(with_scheme);
    }

    None
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_output_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("Could not expand output path '{}'", path))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Build session options from the `crawl` subcommand arguments
pub fn crawl_options_from_args(args: &ArgMatches, show_progress: bool) -> Result<CrawlOptions> {
    let raw_url = args
        .get_one::<String>("URL")
        .ok_or_else(|| anyhow!("A seed URL is required"))?;
    let url = parse_url_line(raw_url).ok_or_else(|| {
        anyhow!(
            "'{}' is not a valid URL (e.g. https://example.com)",
            raw_url
        )
    })?;

    let depth = *args.get_one::<u64>("depth").unwrap_or(&2);
    let sleep = *args.get_one::<f64>("sleep").unwrap_or(&0.5);
    let path = args.get_one::<String>("path").map(String::as_str).unwrap_or("./");
    let threads = *args.get_one::<u64>("threads").unwrap_or(&1);
    let timeout = *args.get_one::<u64>("timeout").unwrap_or(&10);

    let mut options = CrawlOptions::new(url, expand_output_path(path)?);
    options.max_depth = usize::try_from(depth).context("Depth is too large")?;
    options.delay = parse_delay(sleep)?;
    options.workers = usize::try_from(threads).context("Too many threads")?;
    options.timeout = Duration::from_secs(timeout);
    options.show_progress_bars = show_progress;
    options.validate()?;

    Ok(options)
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_session_header(options: &CrawlOptions) {
    print_divider();
    println!("{}", "  DELVE".bright_white().bold());
    print_divider();
    println!("{} Seed:      {}", "→".blue(), options.url.bright_white());
    println!("{} Max depth: {}", "→".blue(), options.max_depth);
    println!("{} Delay:     {:?}", "→".blue(), options.delay);
    println!("{} Workers:   {}", "→".blue(), options.workers);
    println!(
        "{} Output:    {}",
        "→".blue(),
        options.output.display().to_string().bright_white()
    );
    println!();
}

/// Stop issuing new requests on Ctrl-C; in-flight requests still finish.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!(
                "\n{} Interrupted, waiting for in-flight requests to finish...",
                "⚠".yellow().bold()
            );
            token.cancel();
        }
    });
}

/// Render and deliver the report, to `report_path` if given or else to stdout
pub fn deliver_report(
    summary: &CrawlSummary,
    output_dir: &Path,
    format: ReportFormat,
    report_path: Option<&PathBuf>,
    quiet: bool,
) -> Result<()> {
    match report_path {
        Some(path) => {
            let report = render_report(summary, output_dir, format, false)?;
            save_report(&report, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                println!("{} Report saved to {}", "✓".green().bold(), path.display());
            }
        }
        None if !quiet => {
            let report = render_report(summary, output_dir, format, true)?;
            print!("{}", report);
        }
        None => {}
    }
    Ok(())
}

pub async fn handle_crawl(args: &ArgMatches, quiet: bool) -> i32 {
    let options = match crawl_options_from_args(args, !quiet) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            return EXIT_FAILURE;
        }
    };

    let format = args
        .get_one::<String>("format")
        .and_then(|f| f.parse::<ReportFormat>().ok())
        .unwrap_or(ReportFormat::Text);
    let report_path = args.get_one::<PathBuf>("output");

    if !quiet {
        print_session_header(&options);
    }
    debug!(
        "Crawl options: depth={} delay={:?} workers={} timeout={:?}",
        options.max_depth, options.delay, options.workers, options.timeout
    );

    let cancel_token = CancellationToken::new();
    cancel_on_ctrl_c(cancel_token.clone());

    let progress_callback: Option<CrawlProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|message: String| {
            println!("{} {}", "✓".green().bold(), message);
        }))
    };

    let output_dir = options.output.clone();
    let summary = match execute_crawl(options, cancel_token, progress_callback).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("{} Crawl failed: {}", "✗".red().bold(), e);
            return EXIT_FAILURE;
        }
    };

    if summary.seed_unreachable {
        eprintln!(
            "{} The initial URL {} could not be fetched, nothing was saved.\n  Make sure the URL is specified correctly (e.g. https://example.com)",
            "✗".red().bold(),
            summary.seed
        );
    }

    if let Err(e) = deliver_report(&summary, &output_dir, format, report_path, quiet) {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        return EXIT_FAILURE;
    }

    if summary.cancelled {
        EXIT_INTERRUPTED
    } else {
        if !quiet {
            println!("{} Crawl finished.", "✓".green().bold());
        }
        EXIT_OK
    }
}
