use crate::storage::FileSink;
use delve_crawler::crawler::{DEFAULT_DELAY, DEFAULT_MAX_DEPTH, DEFAULT_TIMEOUT};
use delve_crawler::error::{CrawlError, Result};
use delve_crawler::resolver::parse_seed;
use delve_crawler::{CancellationToken, CrawlSummary, Crawler, PageRecord, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Options for configuring a crawl session
#[derive(Debug)]
pub struct CrawlOptions {
    pub url: String,
    pub max_depth: usize,
    pub delay: Duration,
    pub output: PathBuf,
    pub workers: usize,
    pub timeout: Duration,
    pub show_progress_bars: bool,
}

impl CrawlOptions {
    pub fn new(url: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            delay: DEFAULT_DELAY,
            output: output.into(),
            workers: 1,
            timeout: DEFAULT_TIMEOUT,
            show_progress_bars: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(CrawlError::Config(
                "max depth must be a positive integer".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(CrawlError::Config("at least one worker is required".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(CrawlError::Config("timeout must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Callback for reporting session milestones to the user
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Convert a delay given in seconds into a `Duration`, rejecting negative,
/// NaN and infinite values.
pub fn parse_delay(seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds).map_err(|_| {
        CrawlError::Config(format!(
            "delay must be a non-negative number of seconds, got {}",
            seconds
        ))
    })
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Run one crawl session: clear the output location, crawl, and return the
/// summary. `cancel_token` stops the crawl early when cancelled.
pub async fn execute_crawl(
    options: CrawlOptions,
    cancel_token: CancellationToken,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlSummary> {
    options.validate()?;

    let CrawlOptions {
        url,
        max_depth,
        delay,
        output,
        workers,
        timeout,
        show_progress_bars,
    } = options;

    // Reject a bad seed before anything on disk is cleared.
    parse_seed(&url)?;
    let sink = Arc::new(FileSink::create(&output)?);
    debug!(
        "Writing index to {} and pages to {}",
        sink.index_path().display(),
        sink.data_dir().display()
    );

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));

    let internal_progress_callback: ProgressCallback = match progress_bar.clone() {
        Some(pb) => {
            let count = processed_count.clone();
            Arc::new(move |_worker_id: usize, url: String| {
                let count = count.fetch_add(1, Ordering::Relaxed) + 1;
                pb.set_message(format!("[{}] {}", count, url));
                pb.tick();
            })
        }
        None => {
            let count = processed_count.clone();
            Arc::new(move |_worker_id: usize, _url: String| {
                count.fetch_add(1, Ordering::Relaxed);
            })
        }
    };

    let result_callback = {
        let progress_callback = progress_callback.clone();
        let progress_bar = progress_bar.clone();
        let output = output.clone();
        Arc::new(move |record: PageRecord| {
            if record.parent.is_some() || !record.status.is_saved() {
                return;
            }
            if let Some(ref callback) = progress_callback {
                let message = format!(
                    "Initial page was reached successfully. Results will be available in {}",
                    output.display()
                );
                match progress_bar {
                    Some(ref pb) => pb.suspend(|| callback(message)),
                    None => callback(message),
                }
            }
        })
    };

    let crawler = Crawler::new()
        .with_max_depth(max_depth)
        .with_delay(delay)
        .with_workers(workers)
        .with_timeout(timeout)
        .with_progress_callback(internal_progress_callback)
        .with_result_callback(result_callback)
        .with_cancellation_token(cancel_token);

    let result = crawler.crawl(&url, sink).await;

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl finished! {} URLs processed", total));
    }

    result
}
