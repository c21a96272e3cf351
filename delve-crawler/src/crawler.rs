use crate::error::{CrawlError, Result};
use crate::fetcher::{DEFAULT_USER_AGENT, Fetcher, build_client};
use crate::pacer::Pacer;
use crate::processor::extract_links;
use crate::resolver::parse_seed;
use crate::result::{CrawlSummary, PageRecord, PageStatus};
use crate::sink::PageSink;
use crate::visited::VisitedSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
pub type ResultCallback = Arc<dyn Fn(PageRecord) + Send + Sync>;

pub const DEFAULT_MAX_DEPTH: usize = 2;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Crawler {
    max_depth: usize,
    delay: Duration,
    workers: usize,
    timeout: Duration,
    user_agent: String,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
    cancel_token: CancellationToken,
}

impl Crawler {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            delay: DEFAULT_DELAY,
            workers: 1,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            progress_callback: None,
            result_callback: None,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Number of link hops to follow; the seed alone is depth 1.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Minimum spacing between any two requests of a session.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    /// Token that stops the crawl when cancelled. In-flight requests still
    /// finish and are recorded.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Crawl `seed`, saving every successfully fetched page through `sink`.
    ///
    /// Per-page failures never end the session; only an invalid seed or a
    /// client that cannot be built produce an `Err`.
    pub async fn crawl(&self, seed: &str, sink: Arc<dyn PageSink>) -> Result<CrawlSummary> {
        let origin = parse_seed(seed)?;
        let client = build_client(self.timeout, &self.user_agent)?;

        info!(
            "Starting crawl of {} to depth {} with {} workers ({:?} between requests)",
            origin, self.max_depth, self.workers, self.delay
        );

        let session = Arc::new(CrawlSession {
            origin: origin.clone(),
            max_depth: self.max_depth,
            fetcher: Fetcher::new(client, Pacer::new(self.delay)),
            sink,
            visited: VisitedSet::new(),
            frontier: Frontier::new(),
            records: Mutex::new(Vec::new()),
            duplicates: AtomicUsize::new(0),
            seed_unreachable: AtomicBool::new(false),
            cancel_token: self.cancel_token.clone(),
            progress_callback: self.progress_callback.clone(),
            result_callback: self.result_callback.clone(),
        });

        session.visited.insert(&origin).await;
        session
            .frontier
            .push(Task {
                url: origin,
                remaining_depth: self.max_depth,
                parent: None,
            })
            .await;

        let worker_handles: Vec<_> = (0..self.workers)
            .map(|worker_id| tokio::spawn(run_worker(session.clone(), worker_id)))
            .collect();

        for handle in futures::future::join_all(worker_handles).await {
            handle?;
        }

        let summary = session.summary().await;
        if summary.cancelled {
            warn!(
                "Crawl cancelled after {} pages ({} saved)",
                summary.pages.len(),
                summary.saved_count()
            );
        } else {
            info!(
                "Crawl complete. Attempted {} pages, saved {}",
                summary.pages.len(),
                summary.saved_count()
            );
        }
        Ok(summary)
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

/// A URL waiting to be fetched.
#[derive(Debug)]
struct Task {
    url: Url,
    remaining_depth: usize,
    parent: Option<Url>,
}

/// Shared LIFO work stack. With a single worker this walks each branch
/// depth-first before its siblings.
struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
}

#[derive(Default)]
struct FrontierState {
    stack: Vec<Task>,
    in_flight: usize,
}

impl Frontier {
    fn new() -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            notify: Notify::new(),
        }
    }

    async fn push(&self, task: Task) {
        self.state.lock().await.stack.push(task);
        self.notify.notify_waiters();
    }

    /// Next task to run, or `None` once the stack is drained with nothing in
    /// flight or the session is cancelled.
    async fn next(&self, cancel_token: &CancellationToken) -> Option<Task> {
        loop {
            // Registered before inspecting the state so a completion between
            // the check and the await is not missed.
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().await;
                if cancel_token.is_cancelled() {
                    return None;
                }
                if let Some(task) = state.stack.pop() {
                    state.in_flight += 1;
                    return Some(task);
                }
                if state.in_flight == 0 {
                    return None;
                }
            }

            tokio::select! {
                _ = notified => {}
                _ = cancel_token.cancelled() => return None,
            }
        }
    }

    /// Mark one task finished and schedule its children.
    async fn complete(&self, children: Vec<Task>) {
        {
            let mut state = self.state.lock().await;
            state.in_flight -= 1;
            // Reversed so the first child is popped first.
            state.stack.extend(children.into_iter().rev());
        }
        self.notify.notify_waiters();
    }
}

/// Per-crawl state. Every `crawl` call builds a fresh session, so concurrent
/// crawls on the same `Crawler` never share visited URLs or ids.
struct CrawlSession {
    origin: Url,
    max_depth: usize,
    fetcher: Fetcher,
    sink: Arc<dyn PageSink>,
    visited: VisitedSet,
    frontier: Frontier,
    records: Mutex<Vec<PageRecord>>,
    duplicates: AtomicUsize,
    seed_unreachable: AtomicBool,
    cancel_token: CancellationToken,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

async fn run_worker(session: Arc<CrawlSession>, worker_id: usize) {
    debug!("Worker {} started", worker_id);
    while let Some(task) = session.frontier.next(&session.cancel_token).await {
        let children = session.process(worker_id, task).await;
        session.frontier.complete(children).await;
    }
    debug!("Worker {} finished", worker_id);
}

impl CrawlSession {
    /// Fetch, save and expand one page, returning the tasks it discovered.
    async fn process(&self, worker_id: usize, task: Task) -> Vec<Task> {
        let Task {
            url,
            remaining_depth,
            parent,
        } = task;

        if remaining_depth == 0 {
            return Vec::new();
        }

        let Some(attempt) = self.fetcher.fetch(&url, &self.cancel_token).await else {
            return Vec::new();
        };
        if let Some(ref callback) = self.progress_callback {
            callback(worker_id, url.to_string());
        }

        let mut record = PageRecord::new(
            attempt.id,
            url.to_string(),
            self.max_depth - remaining_depth,
            parent.as_ref().map(Url::to_string),
        );
        record.response_time = attempt.response_time;

        let mut children = Vec::new();
        let status = match attempt.outcome.into_body(&url) {
            Ok(body) => {
                if parent.is_none() {
                    info!("Seed page {} reached, crawling...", url);
                }

                let links = extract_links(&body, &url, &self.origin);
                record.content_length = body.len();
                record.links_found = links.iter().map(Url::to_string).collect();

                if remaining_depth > 1 {
                    let found = links.len();
                    let fresh = self.visited.claim_all(links).await;
                    self.duplicates
                        .fetch_add(found - fresh.len(), Ordering::Relaxed);
                    debug!(
                        "[Worker {}] {} new links on {} ({} already scheduled)",
                        worker_id,
                        fresh.len(),
                        url,
                        found - fresh.len()
                    );
                    children = fresh
                        .into_iter()
                        .map(|link| Task {
                            url: link,
                            remaining_depth: remaining_depth - 1,
                            parent: Some(url.clone()),
                        })
                        .collect();
                }

                match self.save(attempt.id, &url, body).await {
                    Ok(()) => PageStatus::Saved,
                    Err(e) => {
                        warn!("Could not save page {} ({}): {}", attempt.id, url, e);
                        PageStatus::StorageError(e.to_string())
                    }
                }
            }
            Err(err) => self.record_failure(&url, parent.as_ref(), err),
        };
        let record = record.with_status(status);

        if let Some(ref callback) = self.result_callback {
            callback(record.clone());
        }
        self.records.lock().await.push(record);

        children
    }

    /// Write the index entry, then the content, off the async runtime.
    ///
    /// The index line is written first, so a failed content write leaves an
    /// index entry without a content file. The page is then recorded as
    /// `StorageError`, which is how reports tell the two apart.
    async fn save(&self, id: u64, url: &Url, body: Vec<u8>) -> Result<()> {
        let sink = self.sink.clone();
        let url = url.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            sink.write_index(id, &url)?;
            sink.write_page(id, &body)
        })
        .await??;
        Ok(())
    }

    /// Log a failed fetch and return the status to record for it.
    fn record_failure(&self, url: &Url, parent: Option<&Url>, err: CrawlError) -> PageStatus {
        match parent {
            None => {
                self.seed_unreachable.store(true, Ordering::SeqCst);
                error!(
                    "Seed {} is unreachable: {}. Make sure the URL is correct (e.g. https://example.com)",
                    url, err
                );
            }
            Some(parent) => {
                warn!("{} (linked from {}). This page will not be saved", err, parent);
            }
        }

        match err {
            CrawlError::Http { status, .. } => PageStatus::HttpError(status),
            CrawlError::Network { detail, .. } => PageStatus::NetworkError(detail),
            other => PageStatus::NetworkError(other.to_string()),
        }
    }

    async fn summary(&self) -> CrawlSummary {
        let mut pages = std::mem::take(&mut *self.records.lock().await);
        pages.sort_by_key(|p| p.id);

        CrawlSummary {
            seed: self.origin.to_string(),
            max_depth: self.max_depth,
            pages,
            duplicates_skipped: self.duplicates.load(Ordering::Relaxed),
            seed_unreachable: self.seed_unreachable.load(Ordering::SeqCst),
            cancelled: self.cancel_token.is_cancelled(),
        }
    }
}
