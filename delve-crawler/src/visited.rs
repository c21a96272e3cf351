use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// Record of every URL a session has already scheduled.
///
/// Membership check and insertion happen under one lock, so two pages that
/// discover the same link at the same time can never both schedule it.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `url`, returning `true` if it was not already present.
    pub async fn insert(&self, url: &Url) -> bool {
        self.inner.lock().await.insert(url.as_str().to_string())
    }

    /// Claim a batch of candidates, returning only those not seen before.
    ///
    /// The whole batch is claimed under a single lock acquisition; the
    /// relative order of the returned URLs follows the input.
    pub async fn claim_all<I>(&self, candidates: I) -> Vec<Url>
    where
        I: IntoIterator<Item = Url>,
    {
        let mut visited = self.inner.lock().await;
        candidates
            .into_iter()
            .filter(|url| visited.insert(url.as_str().to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_insert_reports_novelty() {
        let visited = VisitedSet::new();
        assert!(visited.insert(&url("https://example.com/")).await);
        assert!(!visited.insert(&url("https://example.com/")).await);
        assert!(
            visited
                .claim_all(vec![url("https://example.com/")])
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_claim_all_filters_known_and_repeated() {
        let visited = VisitedSet::new();
        visited.insert(&url("https://example.com/a")).await;

        let claimed = visited
            .claim_all(vec![
                url("https://example.com/a"),
                url("https://example.com/b"),
                url("https://example.com/b"),
                url("https://example.com/c"),
            ])
            .await;

        assert_eq!(
            claimed,
            vec![url("https://example.com/b"), url("https://example.com/c")]
        );
        let again = visited
            .claim_all(vec![url("https://example.com/b"), url("https://example.com/d")])
            .await;
        assert_eq!(again, vec![url("https://example.com/d")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_hand_out_each_url_once() {
        let visited = VisitedSet::new();
        let candidates: Vec<Url> = (0..50)
            .map(|i| url(&format!("https://example.com/page{}", i)))
            .collect();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let visited = visited.clone();
                let candidates = candidates.clone();
                tokio::spawn(async move { visited.claim_all(candidates).await })
            })
            .collect();

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap().len();
        }

        assert_eq!(total, 50);
        assert!(visited.claim_all(candidates).await.is_empty());
    }
}
