// Weekend search pipeline: search one weekend, enrich every cabin the detail
// cache hasn't seen yet with bounded concurrency, then filter the quotes

use crate::cache::DetailCache;
use crate::config::ProviderConfig;
use crate::enricher::{DetailEnricher, EnrichError};
use crate::filter::FilterCriteria;
use crate::models::{CabinDetail, FilteredCabin, Weekend, WeekendResult};
use crate::providers::{AvailabilityProvider, ProviderError};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Weekend {weekend} unavailable: {source}")]
    WeekendUnavailable {
        weekend: String,
        #[source]
        source: ProviderError,
    },
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("None of the {attempted} weekends could be searched")]
    NoWeekendsReachable { attempted: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchSettings {
    pub max_concurrent_fetches: usize,
    pub fetch_timeout: Duration,
}

impl From<&ProviderConfig> for FetchSettings {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            max_concurrent_fetches: config.max_concurrent_fetches,
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
        }
    }
}

pub struct WeekendPipeline {
    search: Arc<dyn AvailabilityProvider>,
    enricher: Arc<DetailEnricher>,
    cache: Arc<DetailCache>,
    criteria: FilterCriteria,
    fetch_timeout: Duration,
    permits: Arc<Semaphore>,
}

impl WeekendPipeline {
    pub fn new(
        search: Arc<dyn AvailabilityProvider>,
        enricher: Arc<DetailEnricher>,
        cache: Arc<DetailCache>,
        criteria: FilterCriteria,
        settings: FetchSettings,
    ) -> Self {
        // A zero-sized pool would never make progress
        let permits = settings.max_concurrent_fetches.max(1);
        Self {
            search,
            enricher,
            cache,
            criteria,
            fetch_timeout: settings.fetch_timeout,
            permits: Arc::new(Semaphore::new(permits)),
        }
    }

    pub fn cache(&self) -> &Arc<DetailCache> {
        &self.cache
    }

    /// Search one weekend and return the quotes whose cabin passes every
    /// filter, in search order.
    ///
    /// Cabins whose detail can't be fetched are dropped from this weekend
    /// only. The call fails just when the search itself is unreachable.
    pub async fn run(&self, weekend: &Weekend) -> Result<Vec<FilteredCabin>, SearchError> {
        let quotes = self.search.search(weekend).await.map_err(|source| {
            SearchError::WeekendUnavailable {
                weekend: weekend.name.clone(),
                source,
            }
        })?;
        info!("{}: {} cabins available", weekend.name, quotes.len());

        let mut details: HashMap<String, Arc<CabinDetail>> = HashMap::new();
        let mut missing = Vec::new();
        {
            let mut seen = HashSet::new();
            for quote in &quotes {
                if !seen.insert(quote.cabin.as_str()) {
                    continue;
                }
                match self.cache.get_if_cached(&quote.cabin) {
                    Some(detail) => {
                        details.insert(quote.cabin.clone(), detail);
                    }
                    None => missing.push(quote.cabin.clone()),
                }
            }
        }

        debug!(
            "{}: {} cached, {} to fetch",
            weekend.name,
            details.len(),
            missing.len()
        );
        details.extend(self.enrich_missing(missing).await);

        let mut survivors = Vec::new();
        for quote in quotes {
            let detail = match details.get(&quote.cabin) {
                Some(detail) => detail,
                None => continue,
            };

            match self.criteria.evaluate(detail) {
                Ok(()) => survivors.push(FilteredCabin {
                    detail: Arc::clone(detail),
                    price: quote.price,
                    weekend: weekend.name.clone(),
                }),
                Err(reason) => warn!("Skipping {}: {}", quote.cabin, reason),
            }
        }

        info!(
            "{}: {} cabins passed filters",
            weekend.name,
            survivors.len()
        );
        Ok(survivors)
    }

    // Fan out one task per cabin and wait for all of them; failures are
    // logged and left out of the returned map
    async fn enrich_missing(&self, cabins: Vec<String>) -> HashMap<String, Arc<CabinDetail>> {
        let handles: Vec<_> = cabins
            .into_iter()
            .map(|cabin| {
                tokio::spawn(fetch_detail(
                    Arc::clone(&self.enricher),
                    Arc::clone(&self.cache),
                    Arc::clone(&self.permits),
                    self.fetch_timeout,
                    cabin,
                ))
            })
            .collect();

        let mut fetched = HashMap::new();
        for joined in join_all(handles).await {
            match joined {
                Ok((cabin, Ok(detail))) => {
                    fetched.insert(cabin, detail);
                }
                Ok((_, Err(e))) => warn!("{}", e),
                Err(e) => error!("Detail fetch task failed: {}", e),
            }
        }
        fetched
    }

    /// Run every weekend in order. A weekend whose search fails is recorded
    /// as unavailable; the run fails only if no weekend could be searched.
    pub async fn run_all(&self, weekends: &[Weekend]) -> Result<WeekendResult, RunError> {
        let mut results = WeekendResult::new();

        for weekend in weekends {
            match self.run(weekend).await {
                Ok(cabins) => results.insert(&weekend.name, cabins),
                Err(e) => {
                    error!("{}", e);
                    results.mark_unavailable(&weekend.name);
                }
            }
        }

        if !weekends.is_empty() && results.is_empty() {
            return Err(RunError::NoWeekendsReachable {
                attempted: weekends.len(),
            });
        }

        let stats = self.cache.stats();
        info!(
            "Searched {} weekends ({} unavailable), {} cabin details cached",
            results.len(),
            results.unavailable.len(),
            stats.items_count
        );
        Ok(results)
    }
}

async fn fetch_detail(
    enricher: Arc<DetailEnricher>,
    cache: Arc<DetailCache>,
    permits: Arc<Semaphore>,
    fetch_timeout: Duration,
    cabin: String,
) -> (String, Result<Arc<CabinDetail>, EnrichError>) {
    let result = match permits.acquire_owned().await {
        Ok(_permit) => {
            // Timeout wraps the fetch only, so the cache records it as failed
            cache
                .get_or_fetch(&cabin, || async {
                    match tokio::time::timeout(fetch_timeout, enricher.enrich(&cabin)).await {
                        Ok(result) => result,
                        Err(_) => Err(EnrichError::DetailUnavailable {
                            cabin: cabin.clone(),
                            reason: format!("timed out after {}ms", fetch_timeout.as_millis()),
                        }),
                    }
                })
                .await
        }
        Err(_) => Err(EnrichError::DetailUnavailable {
            cabin: cabin.clone(),
            reason: "fetch pool closed".to_string(),
        }),
    };
    (cabin, result)
}
