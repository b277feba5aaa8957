// Configuration inputs: filter bounds, amenity vocabulary, slug overrides,
// provider settings and the weekends to search

use crate::filter::FilterCriteria;
use crate::models::Weekend;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Invalid bounds for {field}: min {min} > max {max}")]
    InvalidBounds { field: String, min: u32, max: u32 },
}

/// An amenity as shown in the report, with the listing texts that count as it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Amenity {
    pub name: String,
    pub variants: Vec<String>,
}

impl Amenity {
    pub fn new(name: &str, variants: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }

    // Substring match against any accepted variant
    pub fn matches(&self, text: &str) -> bool {
        self.variants.iter().any(|variant| text.contains(variant.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Bounds {
    pub min_occupancy: u32,
    pub max_occupancy: u32,
    pub min_beds: u32,
    pub max_beds: u32,
    pub min_baths: u32,
    pub max_baths: u32,
    pub min_up_beds: u32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_occupancy: 13,
            max_occupancy: 14,
            min_beds: 4,
            max_beds: 16,
            min_baths: 3,
            max_baths: 14,
            min_up_beds: 2,
        }
    }
}

impl Bounds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pairs = [
            ("occupancy", self.min_occupancy, self.max_occupancy),
            ("beds", self.min_beds, self.max_beds),
            ("baths", self.min_baths, self.max_baths),
        ];
        for (field, min, max) in pairs {
            if min > max {
                return Err(ConfigError::InvalidBounds {
                    field: field.to_string(),
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

// Retry configuration for provider calls
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub search_url: String,
    pub listing_base_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    /// Upper bound for a single cabin's detail fetch, retries included.
    pub fetch_timeout_ms: u64,
    pub max_concurrent_fetches: usize,
    pub retry: RetryConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.deepcreek.com/rcapi/item/avail/search".to_string(),
            listing_base_url: "https://www.deepcreek.com/vacation-rentals".to_string(),
            user_agent: "cabin_rates/0.1".to_string(),
            timeout_ms: 30000,
            fetch_timeout_ms: 60000,
            max_concurrent_fetches: 8,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub bounds: Bounds,
    pub required_amenities: Vec<Amenity>,
    pub optional_amenities: Vec<Amenity>,
    pub slug_overrides: HashMap<String, String>,
    pub provider: ProviderConfig,
    pub weekends: Vec<Weekend>,
    /// Month names whose weekends appear in the report; empty keeps all.
    pub months_to_include: Vec<String>,
    pub output_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            required_amenities: default_required_amenities(),
            optional_amenities: default_optional_amenities(),
            slug_overrides: default_slug_overrides(),
            provider: ProviderConfig::default(),
            weekends: summer_weekends_2026(),
            months_to_include: vec![
                "June".to_string(),
                "July".to_string(),
                "August".to_string(),
            ],
            output_path: PathBuf::from("cabin-report.xml"),
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_json::from_str(json).map_err(|e| ConfigError::JsonParseError(e.to_string()))?;
        config.bounds.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    // Every amenity the listing scan looks for, required first
    pub fn amenity_vocabulary(&self) -> Vec<Amenity> {
        self.required_amenities
            .iter()
            .chain(self.optional_amenities.iter())
            .cloned()
            .collect()
    }

    pub fn required_amenity_names(&self) -> Vec<String> {
        self.required_amenities
            .iter()
            .map(|a| a.name.clone())
            .collect()
    }

    pub fn filter_criteria(&self) -> FilterCriteria {
        FilterCriteria::new(&self.bounds, &self.required_amenities)
    }
}

pub fn default_required_amenities() -> Vec<Amenity> {
    vec![
        Amenity::new("Grill", &["Grills (Gas)"]),
        Amenity::new("A/C", &["A/C: Central Air"]),
        Amenity::new("Wifi", &["Internet: Wifi", "Internet: Mesh WIFI System"]),
        Amenity::new("Fire Pit", &["Outdoor Fire Pit"]),
    ]
}

pub fn default_optional_amenities() -> Vec<Amenity> {
    vec![
        Amenity::new(
            "Pool",
            &["Swimming Pool (Community)", "Swimming Pool (Private)", "CARC"],
        ),
        Amenity::new("Pool Table", &["Pool Table"]),
        Amenity::new("Home Theater", &["Home Theater"]),
    ]
}

// Listings whose slug can't be derived from the display name
pub fn default_slug_overrides() -> HashMap<String, String> {
    [
        ("All In", "all"),
        ("Almost Heaven", "almost-heaven-0"),
        ("A-Frame of Mind", "frame-mind"),
        ("Bear Run Lodge", "bear-run-lodge-0"),
        ("Fireside Lodge", "fireside-lodge-0"),
        ("Get Your Creek On", "get-your-creek"),
        ("Into The Woods", "woods"),
        ("Knotty -N- Nice", "knotty-n-nice"),
        ("Lake Escape", "lake-escape-0"),
        ("On The Rocks", "rocks"),
        ("Pop-a-Top Inn", "pop-top-inn"),
        ("The O A Chalet", "o-chalet"),
        ("Tips Up", "tips"),
    ]
    .into_iter()
    .map(|(name, slug)| (name.to_string(), slug.to_string()))
    .collect()
}

// Friday-to-Monday weekends, June through August 2026
pub fn summer_weekends_2026() -> Vec<Weekend> {
    let weekends = [
        ("June Weekend 1", (6, 5), (6, 8)),
        ("June Weekend 2", (6, 12), (6, 15)),
        ("June Weekend 3", (6, 19), (6, 22)),
        ("June Weekend 4", (6, 26), (6, 29)),
        ("July Weekend 1", (7, 3), (7, 6)),
        ("July Weekend 2", (7, 10), (7, 13)),
        ("July Weekend 3", (7, 17), (7, 20)),
        ("July Weekend 4", (7, 24), (7, 27)),
        ("August Weekend 1", (7, 31), (8, 3)),
        ("August Weekend 2", (8, 7), (8, 10)),
        ("August Weekend 3", (8, 14), (8, 17)),
        ("August Weekend 4", (8, 21), (8, 24)),
        ("August Weekend 5", (8, 28), (8, 31)),
    ];

    weekends
        .iter()
        .filter_map(|(name, (bm, bd), (em, ed))| {
            let begin = NaiveDate::from_ymd_opt(2026, *bm, *bd)?;
            let end = NaiveDate::from_ymd_opt(2026, *em, *ed)?;
            Some(Weekend::new(name, begin, end))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.bounds.validate().is_ok());
        assert_eq!(config.weekends.len(), 13);
        assert_eq!(config.weekends[8].name, "August Weekend 1");
        assert_eq!(
            config.weekends[8].begin,
            NaiveDate::from_ymd_opt(2026, 7, 31).unwrap()
        );
        assert_eq!(config.amenity_vocabulary().len(), 7);
        assert_eq!(
            config.required_amenity_names(),
            vec!["Grill", "A/C", "Wifi", "Fire Pit"]
        );
        assert_eq!(config.slug_overrides["The O A Chalet"], "o-chalet");
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{
            "bounds": {"min_occupancy": 10, "max_occupancy": 18},
            "weekends": [{"name": "July Weekend 3", "begin": "2026-07-17", "end": "2026-07-20"}],
            "provider": {"max_concurrent_fetches": 2}
        }"#;

        let config = Config::from_json(json).unwrap();
        assert_eq!(config.bounds.min_occupancy, 10);
        assert_eq!(config.bounds.max_occupancy, 18);
        assert_eq!(config.bounds.min_beds, 4);
        assert_eq!(config.bounds.min_up_beds, 2);
        assert_eq!(config.weekends.len(), 1);
        assert_eq!(config.provider.max_concurrent_fetches, 2);
        assert_eq!(config.provider.retry.max_retries, 3);
        assert_eq!(config.required_amenities.len(), 4);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let json = r#"{"bounds": {"min_baths": 5, "max_baths": 2}}"#;
        match Config::from_json(json) {
            Err(ConfigError::InvalidBounds { field, min, max }) => {
                assert_eq!(field, "baths");
                assert_eq!((min, max), (5, 2));
            }
            other => panic!("Expected InvalidBounds, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Config::from_json("{not json"),
            Err(ConfigError::JsonParseError(_))
        ));
    }

    #[test]
    fn test_amenity_matches_any_variant() {
        let wifi = Amenity::new("Wifi", &["Internet: Wifi", "Internet: Mesh WIFI System"]);
        assert!(wifi.matches("Internet: Mesh WIFI System (whole house)"));
        assert!(wifi.matches("Internet: Wifi"));
        assert!(!wifi.matches("internet: wifi"));
    }
}
