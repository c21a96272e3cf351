pub mod crawl;
pub mod report;
pub mod storage;

pub use crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl, extract_url_path, parse_delay};
pub use report::{ReportFormat, render_report, save_report};
pub use storage::FileSink;
