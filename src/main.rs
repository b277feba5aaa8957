use anyhow::Context;
use cabin_rates::{
    providers::build_client, weekend_averages, CheapestWeekend, Config, DetailCache,
    DetailEnricher, FetchSettings, HttpAvailabilityProvider, HttpListingProvider,
    ReportAssembler, WeekendPipeline,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };

    let client = build_client(&config.provider)?;
    let search = Arc::new(HttpAvailabilityProvider::new(client.clone(), &config.provider));
    let listings = Arc::new(HttpListingProvider::new(client, &config.provider));
    let enricher = Arc::new(DetailEnricher::from_config(listings, &config)?);
    let cache = Arc::new(DetailCache::new());

    let pipeline = WeekendPipeline::new(
        search,
        enricher,
        Arc::clone(&cache),
        config.filter_criteria(),
        FetchSettings::from(&config.provider),
    );

    info!("Searching {} weekends", config.weekends.len());
    let results = pipeline.run_all(&config.weekends).await?;

    let averages = weekend_averages(&results);
    let report = ReportAssembler::new(config.required_amenity_names())
        .assemble(&results, &averages, &cache.rejected())
        .restrict_to_months(&config.months_to_include);

    match report.cheapest_weekend() {
        CheapestWeekend::Found { weekend, average } => {
            info!("Least expensive weekend: {} (${:.2} average)", weekend, average)
        }
        CheapestWeekend::NoneAvailable => warn!("No weekend had any qualifying cabin"),
    }

    for weekend in report.display_weekends() {
        match report.average_for(&weekend) {
            Some(average) => info!("{}: ${:.2} average", weekend, average),
            None => info!("{}: no qualifying cabins", weekend),
        }
    }

    for name in &report.rejected {
        warn!("Needs follow-up (no bed summary): {}", name);
    }

    report
        .write_to(&config.output_path)
        .with_context(|| format!("writing report to {}", config.output_path.display()))?;
    info!(
        "Wrote {} cabins across {} weekends to {}",
        report.cabins.len(),
        report.weekends.len(),
        config.output_path.display()
    );

    let stats = cache.stats();
    info!(
        "Detail cache: {} items, {} hits, {} misses, {} fetches ({} failed)",
        stats.items_count, stats.hit_count, stats.miss_count, stats.fetch_count, stats.failed_fetch_count
    );

    Ok(())
}
