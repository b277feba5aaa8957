// Detail enrichment: resolve a cabin's listing URL, fetch the page and turn
// the extracted fragments into a complete CabinDetail

use crate::config::Config;
use crate::extract::{ExtractError, ListingExtractor, PartialCabinDetail};
use crate::models::CabinDetail;
use crate::providers::ListingProvider;
use crate::slug::SlugResolver;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone)]
pub enum EnrichError {
    #[error("Detail unavailable for {cabin}: {reason}")]
    DetailUnavailable { cabin: String, reason: String },
}

pub struct DetailEnricher {
    listings: Arc<dyn ListingProvider>,
    resolver: SlugResolver,
    extractor: ListingExtractor,
}

impl DetailEnricher {
    pub fn new(
        listings: Arc<dyn ListingProvider>,
        resolver: SlugResolver,
        extractor: ListingExtractor,
    ) -> Self {
        Self {
            listings,
            resolver,
            extractor,
        }
    }

    pub fn from_config(
        listings: Arc<dyn ListingProvider>,
        config: &Config,
    ) -> Result<Self, ExtractError> {
        let resolver = SlugResolver::new(
            &config.provider.listing_base_url,
            config.slug_overrides.clone(),
        );
        let extractor = ListingExtractor::new(config.amenity_vocabulary())?;
        Ok(Self::new(listings, resolver, extractor))
    }

    pub fn listing_url(&self, cabin: &str) -> String {
        self.resolver.listing_url(cabin)
    }

    /// Fetch and parse one cabin's listing page.
    ///
    /// Only an unreachable provider or an unreadable body fails the call;
    /// missing fragments degrade to zero counts.
    pub async fn enrich(&self, cabin: &str) -> Result<CabinDetail, EnrichError> {
        let url = self.listing_url(cabin);
        info!("Scraping details for cabin: {} @ {}", cabin, url);

        let body = self
            .listings
            .fetch_listing(&url)
            .await
            .map_err(|e| EnrichError::DetailUnavailable {
                cabin: cabin.to_string(),
                reason: e.to_string(),
            })?;

        let content = std::str::from_utf8(&body).map_err(|e| EnrichError::DetailUnavailable {
            cabin: cabin.to_string(),
            reason: format!("listing is not UTF-8: {}", e),
        })?;

        if content.trim().is_empty() {
            return Err(EnrichError::DetailUnavailable {
                cabin: cabin.to_string(),
                reason: "empty listing page".to_string(),
            });
        }

        let partial = self.extractor.extract(content);
        Ok(resolve_detail(cabin, url, partial))
    }
}

// Missing counts become zero; a missing beds summary flags the cabin
pub fn resolve_detail(cabin: &str, url: String, partial: PartialCabinDetail) -> CabinDetail {
    let needs_follow_up = partial.beds.is_none();
    if needs_follow_up {
        warn!("No bed summary found for {}, flagging for follow-up", cabin);
    }

    CabinDetail {
        name: cabin.to_string(),
        url,
        occupancy: partial.occupancy.unwrap_or(0),
        beds: partial.beds.unwrap_or(0),
        bed_levels: partial.bed_levels,
        baths: partial.baths.unwrap_or(0),
        amenities: partial.amenities,
        needs_follow_up,
    }
}
