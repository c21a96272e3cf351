use crate::resolver::{resolve, same_origin};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// Collect every raw anchor target in `content`, in document order.
pub fn extract_hrefs(content: &[u8]) -> Vec<String> {
    let html = String::from_utf8_lossy(content);
    let document = Html::parse_document(&html);

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Extract the same-origin links of a page as a deduplicated candidate set.
///
/// Links that fail to resolve, point back at `page` itself or leave `origin`
/// are dropped without failing the page.
pub fn extract_links(content: &[u8], page: &Url, origin: &Url) -> BTreeSet<Url> {
    let mut links = BTreeSet::new();

    for href in extract_hrefs(content) {
        let absolute = match resolve(&href, page) {
            Ok(url) => url,
            Err(e) => {
                debug!("Dropping link on {}: {}", page, e);
                continue;
            }
        };

        if &absolute == page {
            debug!("  -> Self link {}, skipping", absolute);
        } else if !same_origin(&absolute, origin) {
            debug!("  -> External link {}, skipping", absolute);
        } else {
            links.insert(absolute);
        }
    }

    links
}
