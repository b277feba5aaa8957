// Report assembly: merge per-weekend survivors and averages into one
// cabin-by-weekend table with its derived display values

use crate::aggregate::{cheapest_weekend, mean, CheapestWeekend, WeekendAverage};
use crate::models::{BedCounts, CabinDetail, WeekendResult};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub const LOW_INTENSITY: f64 = 0.3;
pub const HIGH_INTENSITY: f64 = 1.0;
pub const DEFAULT_INTENSITY: f64 = 0.8;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, PartialEq)]
pub struct WeekendPrice {
    pub weekend: String,
    pub price: f64,
}

/// One report row: static attributes plus the weekends the cabin was
/// available. A weekend missing from `prices` means unavailable, not free.
#[derive(Debug, Clone, PartialEq)]
pub struct CabinReport {
    pub name: String,
    pub url: String,
    pub occupancy: u32,
    pub beds: u32,
    pub bed_levels: BedCounts,
    pub baths: u32,
    pub score: u32,
    /// Amenities beyond the required set, sorted.
    pub amenities: Vec<String>,
    pub prices: Vec<WeekendPrice>,
}

impl CabinReport {
    fn from_detail(detail: &CabinDetail, required: &BTreeSet<String>) -> Self {
        Self {
            name: detail.name.clone(),
            url: detail.url.clone(),
            occupancy: detail.occupancy,
            beds: detail.beds,
            bed_levels: detail.bed_levels,
            baths: detail.baths,
            score: detail.score(),
            amenities: detail
                .amenities
                .iter()
                .filter(|a| !required.contains(*a))
                .cloned()
                .collect(),
            prices: Vec::new(),
        }
    }

    pub fn price_for(&self, weekend: &str) -> Option<f64> {
        self.prices
            .iter()
            .find(|p| p.weekend == weekend)
            .map(|p| p.price)
    }

    pub fn min_price(&self) -> Option<f64> {
        self.prices.iter().map(|p| p.price).reduce(f64::min)
    }

    // Every weekend equal to the minimum counts, not only the first
    pub fn is_cheapest(&self, weekend: &str) -> bool {
        match (self.price_for(weekend), self.min_price()) {
            (Some(price), Some(min)) => price == min,
            _ => false,
        }
    }

    pub fn cheapest_weekends(&self) -> Vec<&str> {
        self.prices
            .iter()
            .filter(|p| self.is_cheapest(&p.weekend))
            .map(|p| p.weekend.as_str())
            .collect()
    }

    pub fn average_price(&self) -> Option<f64> {
        mean(self.prices.iter().map(|p| p.price))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportData {
    /// Every searched weekend in search order with its average.
    pub weekends: Vec<WeekendAverage>,
    pub cabins: BTreeMap<String, CabinReport>,
    pub rejected: Vec<String>,
    pub unavailable_weekends: Vec<String>,
}

impl ReportData {
    pub fn cheapest_weekend(&self) -> CheapestWeekend {
        cheapest_weekend(&self.weekends)
    }

    pub fn average_for(&self, weekend: &str) -> Option<f64> {
        self.weekends
            .iter()
            .find(|w| w.weekend == weekend)
            .and_then(|w| w.average)
    }

    // Lowest and highest weekend average, ignoring empty weekends
    pub fn average_range(&self) -> Option<(f64, f64)> {
        let mut averages = self.weekends.iter().filter_map(|w| w.average);
        let first = averages.next()?;
        Some(averages.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    pub fn weekend_intensities(&self) -> Vec<(String, Option<f64>)> {
        let range = self.average_range();
        self.weekends
            .iter()
            .map(|w| {
                let intensity = match (w.average, range) {
                    (Some(avg), Some((min, max))) => Some(color_intensity(avg, min, max)),
                    _ => None,
                };
                (w.weekend.clone(), intensity)
            })
            .collect()
    }

    /// Sorted union of every cabin's displayed amenities.
    pub fn all_amenities(&self) -> Vec<String> {
        self.cabins
            .values()
            .flat_map(|c| c.amenities.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn display_weekends(&self) -> Vec<String> {
        let mut names: Vec<String> = self.weekends.iter().map(|w| w.weekend.clone()).collect();
        sort_weekends(&mut names);
        names
    }

    /// Keep only weekends whose name starts with one of `months`. Cabins left
    /// with no price are dropped. An empty month list keeps everything.
    pub fn restrict_to_months(&self, months: &[String]) -> ReportData {
        if months.is_empty() {
            return self.clone();
        }
        let included = |weekend: &str| {
            weekend
                .split_whitespace()
                .next()
                .map_or(false, |month| months.iter().any(|m| m == month))
        };

        let cabins = self
            .cabins
            .iter()
            .filter_map(|(name, cabin)| {
                let mut cabin = cabin.clone();
                cabin.prices.retain(|p| included(p.weekend.as_str()));
                (!cabin.prices.is_empty()).then(|| (name.clone(), cabin))
            })
            .collect();

        ReportData {
            weekends: self
                .weekends
                .iter()
                .filter(|w| included(w.weekend.as_str()))
                .cloned()
                .collect(),
            cabins,
            rejected: self.rejected.clone(),
            unavailable_weekends: self
                .unavailable_weekends
                .iter()
                .filter(|w| included(w.as_str()))
                .cloned()
                .collect(),
        }
    }
}

/// Map a weekend average onto [0.3, 1.0] across the observed range.
pub fn color_intensity(value: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return DEFAULT_INTENSITY;
    }
    let normalized = ((value - min) / (max - min)).clamp(0.0, 1.0);
    LOW_INTENSITY * (1.0 - normalized) + HIGH_INTENSITY * normalized
}

// Month order, then weekend number; unknown months go last
pub fn sort_weekends(weekends: &mut [String]) {
    weekends.sort_by_key(|name| {
        let mut parts = name.split_whitespace();
        let month = parts
            .next()
            .and_then(|m| MONTHS.iter().position(|known| *known == m))
            .unwrap_or(MONTHS.len());
        let number = parts
            .nth(1)
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(0);
        (month, number)
    });
}

pub struct ReportAssembler {
    required: BTreeSet<String>,
}

impl ReportAssembler {
    pub fn new<I, S>(required_amenities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required_amenities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn assemble(
        &self,
        results: &WeekendResult,
        averages: &[WeekendAverage],
        rejected: &[String],
    ) -> ReportData {
        let mut cabins: BTreeMap<String, CabinReport> = BTreeMap::new();

        for entry in results.iter() {
            for cabin in &entry.cabins {
                let row = cabins
                    .entry(cabin.name().to_string())
                    .or_insert_with(|| CabinReport::from_detail(&cabin.detail, &self.required));

                if row.price_for(&entry.weekend).is_some() {
                    debug!("Duplicate quote for {} on {}", row.name, entry.weekend);
                    continue;
                }
                row.prices.push(WeekendPrice {
                    weekend: entry.weekend.clone(),
                    price: cabin.price,
                });
            }
        }

        ReportData {
            weekends: averages.to_vec(),
            cabins,
            rejected: rejected.to_vec(),
            unavailable_weekends: results.unavailable.clone(),
        }
    }
}
