// On-disk session output: an index file plus one content file per saved page

use delve_crawler::PageSink;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;
use url::Url;

pub const INDEX_FILE: &str = "urls.txt";
pub const DATA_DIR: &str = "data";
pub const PAGE_EXTENSION: &str = "html";

/// Writes `<root>/urls.txt` and `<root>/data/<id>.html`.
pub struct FileSink {
    index_path: PathBuf,
    data_dir: PathBuf,
    index: Mutex<File>,
}

impl FileSink {
    /// Prepare `root` for a fresh session.
    ///
    /// Any previous `data/` directory is deleted and `urls.txt` is truncated.
    /// Nothing else under `root` is touched.
    pub fn create(root: &Path) -> io::Result<Self> {
        fs::create_dir_all(root)?;

        let data_dir = root.join(DATA_DIR);
        if data_dir.exists() {
            debug!("Clearing previous output in {}", data_dir.display());
            fs::remove_dir_all(&data_dir)?;
        }
        fs::create_dir_all(&data_dir)?;

        let index = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(root.join(INDEX_FILE))?;

        Ok(Self {
            index_path: root.join(INDEX_FILE),
            data_dir,
            index: Mutex::new(index),
        })
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn page_path(&self, id: u64) -> PathBuf {
        self.data_dir.join(format!("{}.{}", id, PAGE_EXTENSION))
    }
}

impl PageSink for FileSink {
    fn write_index(&self, id: u64, url: &Url) -> io::Result<()> {
        let mut index = self
            .index
            .lock()
            .map_err(|_| io::Error::other("index file lock poisoned"))?;
        writeln!(index, "{} {}", id, url)?;
        index.flush()
    }

    fn write_page(&self, id: u64, content: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.page_path(id))?;
        file.write_all(content)?;
        file.flush()
    }
}
