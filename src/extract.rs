// Listing page extraction: summary counts, per-level beds and amenities

use crate::config::Amenity;
use crate::models::BedCounts;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use thiserror::Error;

pub const BEDS_SELECTOR: &str = ".rc-lodging-beds";
pub const BATHS_SELECTOR: &str = ".rc-lodging-baths";
pub const OCCUPANCY_SELECTOR: &str = ".rc-lodging-occ";
pub const AMENITY_SELECTOR: &str = "li.amenity-list-item";

pub const UPPER_LEVEL_MARKER: &str = "Upper Level";
pub const MAIN_LEVEL_MARKER: &str = "Main Level";
pub const LOWER_LEVEL_MARKER: &str = "Lower Level";
pub const GARAGE_LEVEL_MARKER: &str = "Above Garage";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid selector {selector}: {message}")]
    InvalidSelector { selector: String, message: String },
}

/// What could be read off one listing page. `None` means the summary
/// fragment was missing or carried no number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialCabinDetail {
    pub occupancy: Option<u32>,
    pub beds: Option<u32>,
    pub baths: Option<u32>,
    pub bed_levels: BedCounts,
    pub amenities: BTreeSet<String>,
}

pub struct ListingExtractor {
    beds: Selector,
    baths: Selector,
    occupancy: Selector,
    amenity_items: Selector,
    vocabulary: Vec<Amenity>,
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

impl ListingExtractor {
    pub fn new(vocabulary: Vec<Amenity>) -> Result<Self, ExtractError> {
        Ok(Self {
            beds: parse_selector(BEDS_SELECTOR)?,
            baths: parse_selector(BATHS_SELECTOR)?,
            occupancy: parse_selector(OCCUPANCY_SELECTOR)?,
            amenity_items: parse_selector(AMENITY_SELECTOR)?,
            vocabulary,
        })
    }

    /// Scan raw listing markup. Never fails: anything not found is left
    /// empty for the caller to resolve.
    pub fn extract(&self, raw: &str) -> PartialCabinDetail {
        let document = Html::parse_document(raw);

        PartialCabinDetail {
            occupancy: summary_count(&document, &self.occupancy),
            beds: summary_count(&document, &self.beds),
            baths: summary_count(&document, &self.baths),
            bed_levels: BedCounts {
                upper: count_fragments(&document, UPPER_LEVEL_MARKER),
                main: count_fragments(&document, MAIN_LEVEL_MARKER),
                lower: count_fragments(&document, LOWER_LEVEL_MARKER),
                above_garage: count_fragments(&document, GARAGE_LEVEL_MARKER),
            },
            amenities: self.amenities(&document),
        }
    }

    fn amenities(&self, document: &Html) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        for item in document.select(&self.amenity_items) {
            let text: String = item.text().collect();
            for amenity in &self.vocabulary {
                if amenity.matches(&text) {
                    found.insert(amenity.name.clone());
                }
            }
        }
        found
    }
}

fn summary_count(document: &Html, selector: &Selector) -> Option<u32> {
    let element = document.select(selector).next()?;
    let text: String = element.text().collect();
    leading_number(text.trim())
}

// First run of ASCII digits in the text
pub fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

// Number of text nodes mentioning the marker
fn count_fragments(document: &Html, marker: &str) -> u32 {
    document
        .root_element()
        .text()
        .filter(|fragment| fragment.contains(marker))
        .count() as u32
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::config::{default_optional_amenities, default_required_amenities};

    fn extractor() -> ListingExtractor {
        let mut vocabulary = default_required_amenities();
        vocabulary.extend(default_optional_amenities());
        ListingExtractor::new(vocabulary).unwrap()
    }

    #[test]
    fn test_extract_full_listing() {
        let partial = extractor().extract(FULL_LISTING);

        assert_eq!(partial.occupancy, Some(14));
        assert_eq!(partial.beds, Some(6));
        assert_eq!(partial.baths, Some(4));
        assert_eq!(
            partial.bed_levels,
            BedCounts {
                upper: 2,
                main: 1,
                lower: 2,
                above_garage: 1,
            }
        );

        let amenities: Vec<&str> = partial.amenities.iter().map(|a| a.as_str()).collect();
        assert_eq!(
            amenities,
            vec!["A/C", "Fire Pit", "Grill", "Pool", "Pool Table", "Wifi"]
        );
    }

    #[test]
    fn test_missing_summaries_are_none() {
        let partial = extractor().extract(NO_SUMMARY_LISTING);

        assert_eq!(partial.occupancy, None);
        assert_eq!(partial.beds, None);
        assert_eq!(partial.baths, None);
        assert_eq!(partial.bed_levels, BedCounts::default());
        assert!(partial.amenities.contains("Wifi"));
        assert_eq!(partial.amenities.len(), 1);
    }

    #[test]
    fn test_garbage_input_extracts_nothing() {
        let partial = extractor().extract("%%% not markup at all");
        assert_eq!(partial, PartialCabinDetail::default());
    }

    #[test]
    fn test_amenity_recorded_once() {
        let html = r#"<ul>
            <li class="amenity-list-item">Swimming Pool (Private)</li>
            <li class="amenity-list-item">CARC access</li>
        </ul>"#;
        let partial = extractor().extract(html);
        assert_eq!(partial.amenities.len(), 1);
        assert!(partial.amenities.contains("Pool"));
    }

    #[test]
    fn test_amenity_outside_list_items_ignored() {
        let html = r#"<p>Grills (Gas) available on request</p>"#;
        assert!(extractor().extract(html).amenities.is_empty());
    }

    #[test]
    fn test_summary_without_digits() {
        let html = r#"<span class="rc-lodging-beds">Bedrooms: ask owner</span>"#;
        assert_eq!(extractor().extract(html).beds, None);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("Sleeps 14"), Some(14));
        assert_eq!(leading_number("3.5 Baths"), Some(3));
        assert_eq!(leading_number("12 Beds / 2 Cribs"), Some(12));
        assert_eq!(leading_number("none"), None);
        assert_eq!(leading_number(""), None);
    }

    #[test]
    fn test_generated_listing_fixture() {
        let html = listing(13, 5, 3, 2, &["Grills (Gas)", "Home Theater"]);
        let partial = extractor().extract(&html);
        assert_eq!(partial.occupancy, Some(13));
        assert_eq!(partial.beds, Some(5));
        assert_eq!(partial.baths, Some(3));
        assert_eq!(partial.bed_levels.upper, 2);
        assert!(partial.amenities.contains("Grill"));
        assert!(partial.amenities.contains("Home Theater"));
    }
}
