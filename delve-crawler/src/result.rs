use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Terminal state of one fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum PageStatus {
    Saved,
    HttpError(u16),
    NetworkError(String),
    StorageError(String),
}

impl PageStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, PageStatus::Saved)
    }
}

/// One attempted page. Ids are reserved when the request is issued, so failed
/// pages keep theirs even though they never reach the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: u64,
    pub url: String,
    /// Hops from the seed; the seed is 0.
    pub depth: usize,
    pub parent: Option<String>,
    pub status: PageStatus,
    pub content_length: usize,
    pub response_time: Duration,
    pub links_found: Vec<String>,
}

impl PageRecord {
    pub fn new(id: u64, url: String, depth: usize, parent: Option<String>) -> Self {
        Self {
            id,
            url,
            depth,
            parent,
            status: PageStatus::Saved,
            content_length: 0,
            response_time: Duration::from_secs(0),
            links_found: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: PageStatus) -> Self {
        self.status = status;
        self
    }
}

/// Everything a finished (or cancelled) session produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub seed: String,
    pub max_depth: usize,
    pub pages: Vec<PageRecord>,
    /// Links that were discovered again after already being scheduled.
    pub duplicates_skipped: usize,
    pub seed_unreachable: bool,
    pub cancelled: bool,
}

impl CrawlSummary {
    pub fn saved_count(&self) -> usize {
        self.pages.iter().filter(|p| p.status.is_saved()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.pages.len() - self.saved_count()
    }
}
