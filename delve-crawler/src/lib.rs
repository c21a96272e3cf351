pub mod crawler;
pub mod error;
pub mod fetcher;
pub mod pacer;
pub mod processor;
pub mod resolver;
pub mod result;
pub mod sink;
pub mod visited;

pub use crawler::{Crawler, ProgressCallback, ResultCallback};
pub use error::CrawlError;
pub use fetcher::{Attempt, FetchOutcome, Fetcher};
pub use result::{CrawlSummary, PageRecord, PageStatus};
pub use sink::{MemorySink, PageSink};
pub use tokio_util::sync::CancellationToken;
