// Cross-weekend aggregation: per-weekend average price and the cheapest weekend

use crate::models::{FilteredCabin, WeekendResult};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct WeekendAverage {
    pub weekend: String,
    /// `None` when no cabin survived filtering that weekend.
    pub average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheapestWeekend {
    Found { weekend: String, average: f64 },
    NoneAvailable,
}

pub fn average_price(cabins: &[FilteredCabin]) -> Option<f64> {
    mean(cabins.iter().map(|c| c.price))
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (total, count) = values.fold((0.0, 0usize), |(total, count), v| (total + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

pub fn weekend_averages(results: &WeekendResult) -> Vec<WeekendAverage> {
    results
        .iter()
        .map(|entry| WeekendAverage {
            weekend: entry.weekend.clone(),
            average: average_price(&entry.cabins),
        })
        .collect()
}

// None sorts after every price
fn compare_averages(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Lowest average wins; on ties the earliest weekend is kept.
pub fn cheapest_weekend(averages: &[WeekendAverage]) -> CheapestWeekend {
    let best = averages
        .iter()
        .reduce(|best, candidate| {
            if compare_averages(candidate.average, best.average) == Ordering::Less {
                candidate
            } else {
                best
            }
        });

    match best {
        Some(WeekendAverage {
            weekend,
            average: Some(average),
        }) => CheapestWeekend::Found {
            weekend: weekend.clone(),
            average: *average,
        },
        _ => CheapestWeekend::NoneAvailable,
    }
}
