// Durable report artifact: one XML document per run that reads back into
// exactly the ReportData it was written from

use crate::aggregate::WeekendAverage;
use crate::models::BedCounts;
use crate::report::{CabinReport, ReportData, WeekendPrice};
use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("XML parse error: {0}")]
    XmlParseError(String),

    #[error("Conversion error: {0}")]
    ConversionError(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// Structures for XML (de)serialization
#[derive(Debug, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, rename = "CabinReport")]
pub struct XmlCabinReport {
    #[serde(rename = "Weekend")]
    pub weekends: Vec<XmlWeekend>,
    #[serde(rename = "Amenities")]
    pub amenities: XmlAmenityIndex,
    #[serde(rename = "Rejected")]
    pub rejected: XmlNameList,
    #[serde(rename = "Unavailable")]
    pub unavailable: XmlNameList,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct XmlWeekend {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@average", skip_serializing_if = "Option::is_none")]
    pub average: Option<String>,
    #[serde(rename = "Cabin")]
    pub cabins: Vec<XmlCabin>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct XmlCabin {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@price")]
    pub price: String,
    #[serde(rename = "@url")]
    pub url: String,
    #[serde(rename = "@occupancy")]
    pub occupancy: String,
    #[serde(rename = "@beds")]
    pub beds: String,
    #[serde(rename = "@baths")]
    pub baths: String,
    #[serde(rename = "@upperBeds")]
    pub upper_beds: String,
    #[serde(rename = "@mainBeds")]
    pub main_beds: String,
    #[serde(rename = "@lowerBeds")]
    pub lower_beds: String,
    #[serde(rename = "@garageBeds")]
    pub garage_beds: String,
    #[serde(rename = "@score")]
    pub score: String,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct XmlAmenityIndex {
    #[serde(rename = "Cabin")]
    pub cabins: Vec<XmlCabinAmenities>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct XmlCabinAmenities {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "Amenity")]
    pub amenities: Vec<String>,
}

#[derive(Debug, PartialEq, Default, Deserialize, Clone, Serialize)]
#[serde(default)]
pub struct XmlNameList {
    #[serde(rename = "Name")]
    pub names: Vec<String>,
}

fn parse_field<T: FromStr>(value: &str, field: &str, cabin: &str) -> Result<T, ReportError> {
    value.parse().map_err(|_| {
        ReportError::ConversionError(format!("{} {:?} for {} is not a number", field, value, cabin))
    })
}

impl XmlCabin {
    fn new(cabin: &CabinReport, price: f64) -> Self {
        Self {
            name: cabin.name.clone(),
            price: price.to_string(),
            url: cabin.url.clone(),
            occupancy: cabin.occupancy.to_string(),
            beds: cabin.beds.to_string(),
            baths: cabin.baths.to_string(),
            upper_beds: cabin.bed_levels.upper.to_string(),
            main_beds: cabin.bed_levels.main.to_string(),
            lower_beds: cabin.bed_levels.lower.to_string(),
            garage_beds: cabin.bed_levels.above_garage.to_string(),
            score: cabin.score.to_string(),
        }
    }

    fn price(&self) -> Result<f64, ReportError> {
        parse_field(&self.price, "price", &self.name)
    }

    fn to_cabin_report(&self) -> Result<CabinReport, ReportError> {
        let name = self.name.as_str();
        Ok(CabinReport {
            name: self.name.clone(),
            url: self.url.clone(),
            occupancy: parse_field(&self.occupancy, "occupancy", name)?,
            beds: parse_field(&self.beds, "beds", name)?,
            bed_levels: BedCounts {
                upper: parse_field(&self.upper_beds, "upperBeds", name)?,
                main: parse_field(&self.main_beds, "mainBeds", name)?,
                lower: parse_field(&self.lower_beds, "lowerBeds", name)?,
                above_garage: parse_field(&self.garage_beds, "garageBeds", name)?,
            },
            baths: parse_field(&self.baths, "baths", name)?,
            score: parse_field(&self.score, "score", name)?,
            amenities: Vec::new(),
            prices: Vec::new(),
        })
    }
}

impl From<&ReportData> for XmlCabinReport {
    fn from(report: &ReportData) -> Self {
        let weekends = report
            .weekends
            .iter()
            .map(|weekend| XmlWeekend {
                name: weekend.weekend.clone(),
                average: weekend.average.map(|avg| avg.to_string()),
                cabins: report
                    .cabins
                    .values()
                    .filter_map(|cabin| {
                        cabin
                            .price_for(&weekend.weekend)
                            .map(|price| XmlCabin::new(cabin, price))
                    })
                    .collect(),
            })
            .collect();

        let amenities = XmlAmenityIndex {
            cabins: report
                .cabins
                .values()
                .map(|cabin| XmlCabinAmenities {
                    name: cabin.name.clone(),
                    amenities: cabin.amenities.clone(),
                })
                .collect(),
        };

        XmlCabinReport {
            weekends,
            amenities,
            rejected: XmlNameList {
                names: report.rejected.clone(),
            },
            unavailable: XmlNameList {
                names: report.unavailable_weekends.clone(),
            },
        }
    }
}

impl TryFrom<XmlCabinReport> for ReportData {
    type Error = ReportError;

    fn try_from(xml: XmlCabinReport) -> Result<Self, Self::Error> {
        let mut weekends = Vec::new();
        let mut cabins: BTreeMap<String, CabinReport> = BTreeMap::new();

        for weekend in &xml.weekends {
            if weekend.name.is_empty() {
                return Err(ReportError::InvalidFormat(
                    "weekend without a name".to_string(),
                ));
            }

            let average = match &weekend.average {
                Some(avg) => Some(parse_field(avg, "average", &weekend.name)?),
                None => None,
            };
            weekends.push(WeekendAverage {
                weekend: weekend.name.clone(),
                average,
            });

            for xml_cabin in &weekend.cabins {
                let price = xml_cabin.price()?;
                // Static attributes come from the first weekend listing the cabin
                if !cabins.contains_key(&xml_cabin.name) {
                    cabins.insert(xml_cabin.name.clone(), xml_cabin.to_cabin_report()?);
                }
                if let Some(cabin) = cabins.get_mut(&xml_cabin.name) {
                    cabin.prices.push(WeekendPrice {
                        weekend: weekend.name.clone(),
                        price,
                    });
                }
            }
        }

        for entry in xml.amenities.cabins {
            if let Some(cabin) = cabins.get_mut(&entry.name) {
                cabin.amenities = entry.amenities;
            }
        }

        Ok(ReportData {
            weekends,
            cabins,
            rejected: xml.rejected.names,
            unavailable_weekends: xml.unavailable.names,
        })
    }
}

impl ReportData {
    pub fn to_xml(&self) -> Result<String, ReportError> {
        let xml = XmlCabinReport::from(self);
        quick_xml::se::to_string(&xml).map_err(|e| ReportError::ConversionError(e.to_string()))
    }

    pub fn from_xml(xml: &str) -> Result<Self, ReportError> {
        let parsed: XmlCabinReport =
            from_str(xml).map_err(|e| ReportError::XmlParseError(e.to_string()))?;
        ReportData::try_from(parsed)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        std::fs::write(path, self.to_xml()?)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_xml(&content)
    }
}
