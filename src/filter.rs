// Filter pipeline: numeric bounds, required amenities and upper-level beds

use crate::config::{Amenity, Bounds};
use crate::models::CabinDetail;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub bounds: Bounds,
    pub required_amenities: BTreeSet<String>,
}

/// Why a cabin was dropped from a weekend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Occupancy(u32),
    Beds(u32),
    Baths(u32),
    MissingAmenities(Vec<String>),
    UpperBeds(u32),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Occupancy(n) => write!(f, "occupancy {} out of range", n),
            Rejection::Beds(n) => write!(f, "{} beds out of range", n),
            Rejection::Baths(n) => write!(f, "{} baths out of range", n),
            Rejection::MissingAmenities(missing) => {
                write!(f, "missing amenities: {}", missing.join(", "))
            }
            Rejection::UpperBeds(n) => write!(f, "not enough upper beds: {}", n),
        }
    }
}

impl FilterCriteria {
    pub fn new(bounds: &Bounds, required: &[Amenity]) -> Self {
        Self {
            bounds: bounds.clone(),
            required_amenities: required.iter().map(|a| a.name.clone()).collect(),
        }
    }

    /// Check every criterion, reporting the first one that fails.
    pub fn evaluate(&self, cabin: &CabinDetail) -> Result<(), Rejection> {
        let b = &self.bounds;

        if !(b.min_occupancy..=b.max_occupancy).contains(&cabin.occupancy) {
            return Err(Rejection::Occupancy(cabin.occupancy));
        }

        if !(b.min_beds..=b.max_beds).contains(&cabin.beds) {
            return Err(Rejection::Beds(cabin.beds));
        }

        if !(b.min_baths..=b.max_baths).contains(&cabin.baths) {
            return Err(Rejection::Baths(cabin.baths));
        }

        if !cabin.amenities.is_superset(&self.required_amenities) {
            let missing = self
                .required_amenities
                .difference(&cabin.amenities)
                .cloned()
                .collect();
            return Err(Rejection::MissingAmenities(missing));
        }

        if cabin.bed_levels.upper < b.min_up_beds {
            return Err(Rejection::UpperBeds(cabin.bed_levels.upper));
        }

        Ok(())
    }

    pub fn accepts(&self, cabin: &CabinDetail) -> bool {
        self.evaluate(cabin).is_ok()
    }
}
