use crate::error::{CrawlError, Result};
use crate::pacer::Pacer;
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = concat!("Delve/", env!("CARGO_PKG_VERSION"));

/// Outcome of a single page request. Only `Success` pages are saved and expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(Vec<u8>),
    HttpError(u16),
    NetworkError(String),
}

impl FetchOutcome {
    /// The page body, or the error explaining why there is none.
    pub fn into_body(self, url: &Url) -> Result<Vec<u8>> {
        match self {
            FetchOutcome::Success(body) => Ok(body),
            FetchOutcome::HttpError(status) => Err(CrawlError::Http {
                url: url.to_string(),
                status,
            }),
            FetchOutcome::NetworkError(detail) => Err(CrawlError::Network {
                url: url.to_string(),
                detail,
            }),
        }
    }
}

/// A request that was actually issued.
#[derive(Debug)]
pub struct Attempt {
    /// 1-based, in the order requests were issued.
    pub id: u64,
    pub outcome: FetchOutcome,
    pub response_time: Duration,
}

/// Build the HTTP client used for every request of a crawler.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout / 2)
        .pool_max_idle_per_host(16)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| CrawlError::Client(e.to_string()))
}

/// Paced page fetcher for one session. Numbers every request it issues.
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    pacer: Pacer,
    attempts: AtomicU64,
}

impl Fetcher {
    pub fn new(client: Client, pacer: Pacer) -> Self {
        Self {
            client,
            pacer,
            attempts: AtomicU64::new(0),
        }
    }

    /// Wait for the next pacing slot, then request `url`.
    ///
    /// Returns `None` without touching the network when `cancel_token` fires
    /// during the wait. Once issued, a request always runs to completion.
    pub async fn fetch(&self, url: &Url, cancel_token: &CancellationToken) -> Option<Attempt> {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                debug!("Cancelled before fetching {}", url);
                return None;
            }
            _ = self.pacer.wait() => {}
        }

        let id = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let (outcome, response_time) = self.request(url).await;
        Some(Attempt {
            id,
            outcome,
            response_time,
        })
    }

    async fn request(&self, url: &Url) -> (FetchOutcome, Duration) {
        debug!("Fetching {}", url);
        let start = Instant::now();

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return (FetchOutcome::NetworkError(describe(&e)), start.elapsed()),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return (FetchOutcome::HttpError(status.as_u16()), start.elapsed());
        }

        let outcome = match response.bytes().await {
            Ok(body) => FetchOutcome::Success(body.to_vec()),
            Err(e) => FetchOutcome::NetworkError(describe(&e)),
        };
        (outcome, start.elapsed())
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}
