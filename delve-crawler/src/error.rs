use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Unparsable URL '{href}' found on {page}: {reason}")]
    UnparsableUrl {
        href: String,
        page: String,
        reason: String,
    },

    #[error("Unsupported scheme '{scheme}' in link '{href}'")]
    UnsupportedScheme { href: String, scheme: String },

    #[error("Network error for {url}: {detail}")]
    Network { url: String, detail: String },

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("Invalid seed URL: {0}")]
    InvalidSeed(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
