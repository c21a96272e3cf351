//! Storage contract the crawl engine writes saved pages through.

use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex;
use url::Url;

/// Append-only storage for one crawl session.
///
/// The engine calls `write_index` and then `write_page` once per saved page,
/// from a blocking thread.
pub trait PageSink: Send + Sync {
    /// Append one `(id, url)` entry to the session index.
    fn write_index(&self, id: u64, url: &Url) -> io::Result<()>;

    /// Store the raw content of page `id`. Each id is written at most once.
    fn write_page(&self, id: u64, content: &[u8]) -> io::Result<()>;
}

/// In-memory sink, for library users that post-process pages themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    index: Mutex<Vec<(u64, String)>>,
    pages: Mutex<BTreeMap<u64, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index entries in write order.
    pub fn index(&self) -> Vec<(u64, String)> {
        self.index.lock().map(|i| i.clone()).unwrap_or_default()
    }

    pub fn page(&self, id: u64) -> Option<Vec<u8>> {
        self.pages.lock().ok()?.get(&id).cloned()
    }

    pub fn page_count(&self) -> usize {
        self.pages.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl PageSink for MemorySink {
    fn write_index(&self, id: u64, url: &Url) -> io::Result<()> {
        let mut index = self
            .index
            .lock()
            .map_err(|_| io::Error::other("index lock poisoned"))?;
        index.push((id, url.to_string()));
        Ok(())
    }

    fn write_page(&self, id: u64, content: &[u8]) -> io::Result<()> {
        let mut pages = self
            .pages
            .lock()
            .map_err(|_| io::Error::other("page store lock poisoned"))?;
        if pages.contains_key(&id) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("page {} already stored", id),
            ));
        }
        pages.insert(id, content.to_vec());
        Ok(())
    }
}
