// Cabin rate survey: weekend availability search, listing enrichment,
// filtering and cross-weekend price aggregation

pub mod aggregate;
pub mod artifact;
pub mod cache;
pub mod config;
pub mod enricher;
pub mod extract;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod slug;

// Re-export key types for convenience
pub use aggregate::{cheapest_weekend, weekend_averages, CheapestWeekend, WeekendAverage};
pub use artifact::ReportError;
pub use cache::{CacheStatsReport, DetailCache};
pub use config::{Amenity, Bounds, Config, ConfigError, ProviderConfig, RetryConfig};
pub use enricher::{DetailEnricher, EnrichError};
pub use extract::{ExtractError, ListingExtractor};
pub use filter::{FilterCriteria, Rejection};
pub use models::{CabinDetail, FilteredCabin, PriceQuote, Weekend, WeekendResult};
pub use pipeline::{FetchSettings, RunError, SearchError, WeekendPipeline};
pub use providers::{
    AvailabilityProvider, HttpAvailabilityProvider, HttpListingProvider, ListingProvider,
    ProviderError,
};
pub use report::{CabinReport, ReportAssembler, ReportData};
pub use slug::{name_to_slug, SlugResolver};
