// Run-scoped memo of enriched cabin details, shared by every weekend pass.
// Entries are never evicted or replaced once stored.

use crate::enricher::EnrichError;
use crate::models::CabinDetail;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct CacheStats {
    pub hit_count: AtomicUsize,
    pub miss_count: AtomicUsize,
    pub fetch_count: AtomicUsize,
    pub failed_fetch_count: AtomicUsize,
    pub items_count: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStatsReport {
    pub hit_count: usize,
    pub miss_count: usize,
    pub fetch_count: usize,
    pub failed_fetch_count: usize,
    pub items_count: usize,
    pub rejected_count: usize,
}

#[derive(Debug, Default)]
pub struct DetailCache {
    details: DashMap<String, Arc<CabinDetail>>,
    // Cabins whose listing lacked a beds summary, in first-seen order
    rejected: Mutex<Vec<String>>,
    stats: CacheStats,
}

impl DetailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cabin: &str) -> Option<Arc<CabinDetail>> {
        let found = self.details.get(cabin).map(|entry| Arc::clone(entry.value()));
        if found.is_some() {
            self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
        } else {
            self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
        }
        found
    }

    /// Like [`get`](Self::get) but a miss isn't counted, for callers that
    /// follow a miss with [`get_or_fetch`](Self::get_or_fetch).
    pub fn get_if_cached(&self, cabin: &str) -> Option<Arc<CabinDetail>> {
        let found = self.details.get(cabin).map(|entry| Arc::clone(entry.value()));
        if found.is_some() {
            self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
        }
        found
    }

    pub fn contains(&self, cabin: &str) -> bool {
        self.details.contains_key(cabin)
    }

    /// Store a fully built detail. If another writer got there first the
    /// existing entry is kept and returned.
    pub fn insert(&self, detail: CabinDetail) -> Arc<CabinDetail> {
        let name = detail.name.clone();
        let needs_follow_up = detail.needs_follow_up;
        let mut inserted = false;

        let stored = Arc::clone(
            self.details
                .entry(name.clone())
                .or_insert_with(|| {
                    inserted = true;
                    Arc::new(detail)
                })
                .value(),
        );

        if inserted {
            self.stats.items_count.fetch_add(1, Ordering::SeqCst);
            if needs_follow_up {
                let mut rejected = self.rejected.lock();
                if !rejected.contains(&name) {
                    rejected.push(name);
                }
            }
        }
        stored
    }

    /// Return the cached detail for `cabin`, running `fetch` only when none
    /// has been stored yet. Failed fetches are not cached.
    ///
    /// Concurrent first lookups of the same cabin are not coalesced; each
    /// runs its own fetch and the first one stored wins.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        cabin: &str,
        fetch: F,
    ) -> Result<Arc<CabinDetail>, EnrichError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CabinDetail, EnrichError>>,
    {
        if let Some(detail) = self.get(cabin) {
            debug!("Detail cache hit for {}", cabin);
            return Ok(detail);
        }

        self.stats.fetch_count.fetch_add(1, Ordering::SeqCst);
        match fetch().await {
            Ok(detail) => Ok(self.insert(detail)),
            Err(e) => {
                self.stats.failed_fetch_count.fetch_add(1, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    pub fn rejected(&self) -> Vec<String> {
        self.rejected.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            hit_count: self.stats.hit_count.load(Ordering::SeqCst),
            miss_count: self.stats.miss_count.load(Ordering::SeqCst),
            fetch_count: self.stats.fetch_count.load(Ordering::SeqCst),
            failed_fetch_count: self.stats.failed_fetch_count.load(Ordering::SeqCst),
            items_count: self.stats.items_count.load(Ordering::SeqCst),
            rejected_count: self.rejected.lock().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BedCounts;
    use std::collections::BTreeSet;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn detail(name: &str, occupancy: u32) -> CabinDetail {
        CabinDetail {
            name: name.to_string(),
            url: format!("https://example.com/{}", name),
            occupancy,
            beds: 5,
            bed_levels: BedCounts::default(),
            baths: 3,
            amenities: BTreeSet::new(),
            needs_follow_up: false,
        }
    }

    #[test]
    fn test_second_lookup_served_from_cache() {
        let cache = DetailCache::new();
        let calls = AtomicUsize::new(0);

        let first = tokio_test::block_on(cache.get_or_fetch("Tips Up", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(detail("Tips Up", 14))
        }))
        .unwrap();

        let second = tokio_test::block_on(cache.get_or_fetch("Tips Up", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(detail("Tips Up", 99))
        }))
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.occupancy, 14);

        let stats = cache.stats();
        assert_eq!(stats.fetch_count, 1);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.items_count, 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_not_cached() {
        let cache = DetailCache::new();

        let result = cache
            .get_or_fetch("Lake Escape", || async {
                Err(EnrichError::DetailUnavailable {
                    cabin: "Lake Escape".to_string(),
                    reason: "connection refused".to_string(),
                })
            })
            .await;
        assert!(result.is_err());
        assert!(!cache.contains("Lake Escape"));

        let retried = cache
            .get_or_fetch("Lake Escape", || async { Ok(detail("Lake Escape", 13)) })
            .await;
        tokio_test::assert_ok!(retried);

        let stats = cache.stats();
        assert_eq!(stats.fetch_count, 2);
        assert_eq!(stats.failed_fetch_count, 1);
        assert_eq!(stats.items_count, 1);
    }

    #[test]
    fn test_lookup_then_fetch_counts_one_miss() {
        let cache = DetailCache::new();

        assert!(cache.get_if_cached("Tips Up").is_none());
        let fetched = tokio_test::block_on(
            cache.get_or_fetch("Tips Up", || async { Ok(detail("Tips Up", 14)) }),
        );
        tokio_test::assert_ok!(fetched);
        assert!(cache.get_if_cached("Tips Up").is_some());

        let stats = cache.stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.fetch_count, 1);
    }

    #[test]
    fn test_first_writer_wins() {
        let cache = DetailCache::new();
        let first = cache.insert(detail("All In", 13));
        let second = cache.insert(detail("All In", 18));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.get("All In").unwrap().occupancy, 13);
        assert_eq!(cache.stats().items_count, 1);
    }

    #[test]
    fn test_rejected_recorded_once() {
        let cache = DetailCache::new();
        let mut flagged = detail("Mystery Cabin", 0);
        flagged.needs_follow_up = true;

        cache.insert(flagged.clone());
        cache.insert(flagged);
        cache.insert(detail("Tips Up", 14));

        assert_eq!(cache.rejected(), vec!["Mystery Cabin".to_string()]);
        assert_eq!(cache.stats().rejected_count, 1);
    }

    #[test]
    fn test_concurrent_inserts_for_distinct_keys() {
        let cache = Arc::new(DetailCache::new());
        let threads_count = 8;
        let per_thread = 50;

        let handles: Vec<_> = (0..threads_count)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        let name = format!("cabin-{}-{}", t, i);
                        cache.insert(detail(&name, 13));
                        assert!(cache.get(&name).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), threads_count * per_thread);
        assert_eq!(cache.stats().items_count, threads_count * per_thread);
    }
}
