// Core data model for availability quotes and enriched cabin details

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

// Data structures for the availability search JSON response
#[derive(Debug, Deserialize, Serialize)]
pub struct SearchRecord {
    #[serde(default)]
    pub eid: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub prices: Vec<SearchRate>,
    #[serde(default, rename = "type")]
    pub listing_type: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SearchRate {
    #[serde(default)]
    pub eid: Option<i64>,
    pub p: f64,
    #[serde(default)]
    pub c: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub qp: Option<serde_json::Value>,
}

/// One price observation for one cabin on one weekend.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub cabin: String,
    pub listing_id: Option<i64>,
    pub price: f64,
    /// Occupancy/date query echoed back by the provider, kept verbatim.
    pub metadata: Option<serde_json::Value>,
}

impl SearchRecord {
    // The first rate is the stay price; records without any rate can't be priced
    pub fn into_quote(self) -> Option<PriceQuote> {
        let rate = self.prices.into_iter().next()?;
        Some(PriceQuote {
            cabin: self.name,
            listing_id: self.eid,
            price: rate.p,
            metadata: rate.qp,
        })
    }
}

/// A named stay window used as the unit of availability search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Weekend {
    pub name: String,
    pub begin: NaiveDate,
    pub end: NaiveDate,
}

impl Weekend {
    pub fn new(name: &str, begin: NaiveDate, end: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            begin,
            end,
        }
    }
}

// Bed counts partitioned by level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BedCounts {
    pub upper: u32,
    pub main: u32,
    pub lower: u32,
    pub above_garage: u32,
}

impl BedCounts {
    pub fn total(&self) -> u32 {
        self.upper + self.main + self.lower + self.above_garage
    }

    // Number of levels that have at least one bed
    pub fn levels_used(&self) -> u32 {
        [self.upper, self.main, self.lower, self.above_garage]
            .iter()
            .filter(|&&count| count > 0)
            .count() as u32
    }
}

// Score weights
const OCCUPANCY_WEIGHT: u32 = 2;
const BATH_WEIGHT: u32 = 3;
const BED_WEIGHT: u32 = 2;
const AMENITY_WEIGHT: u32 = 5;
const UPPER_BED_WEIGHT: u32 = 1;
const LEVEL_WEIGHT: u32 = 1;

/// Time-invariant attributes of a cabin, scraped from its listing page.
///
/// Once stored in the [`DetailCache`](crate::cache::DetailCache) a detail is
/// never replaced for the remainder of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CabinDetail {
    pub name: String,
    pub url: String,
    pub occupancy: u32,
    /// Bedroom count from the listing summary. Not derived from
    /// `bed_levels`, so it can differ from `bed_levels.total()`.
    pub beds: u32,
    pub bed_levels: BedCounts,
    pub baths: u32,
    pub amenities: BTreeSet<String>,
    /// Set when the beds summary was missing from the listing page.
    pub needs_follow_up: bool,
}

impl CabinDetail {
    /// Display ranking derived from the static attributes. Non-decreasing in
    /// every input.
    pub fn score(&self) -> u32 {
        self.occupancy * OCCUPANCY_WEIGHT
            + self.baths * BATH_WEIGHT
            + self.beds * BED_WEIGHT
            + self.amenities.len() as u32 * AMENITY_WEIGHT
            + self.bed_levels.upper * UPPER_BED_WEIGHT
            + self.bed_levels.levels_used() * LEVEL_WEIGHT
    }

    pub fn has_amenity(&self, amenity: &str) -> bool {
        self.amenities.contains(amenity)
    }
}

/// A cabin detail joined with one weekend's price.
#[derive(Debug, Clone)]
pub struct FilteredCabin {
    pub detail: Arc<CabinDetail>,
    pub price: f64,
    pub weekend: String,
}

impl FilteredCabin {
    pub fn name(&self) -> &str {
        &self.detail.name
    }
}

#[derive(Debug, Clone)]
pub struct WeekendCabins {
    pub weekend: String,
    pub cabins: Vec<FilteredCabin>,
}

/// Surviving cabins per weekend, in search order, plus the weekends whose
/// search could not be completed.
#[derive(Debug, Clone, Default)]
pub struct WeekendResult {
    pub entries: Vec<WeekendCabins>,
    pub unavailable: Vec<String>,
}

impl WeekendResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, weekend: &str, cabins: Vec<FilteredCabin>) {
        self.entries.push(WeekendCabins {
            weekend: weekend.to_string(),
            cabins,
        });
    }

    pub fn mark_unavailable(&mut self, weekend: &str) {
        self.unavailable.push(weekend.to_string());
    }

    pub fn get(&self, weekend: &str) -> Option<&[FilteredCabin]> {
        self.entries
            .iter()
            .find(|entry| entry.weekend == weekend)
            .map(|entry| entry.cabins.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeekendCabins> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
