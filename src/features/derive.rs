//! Stateless derived-feature computations
//!
//! Pure functions over a single property record. Ratios replace a zero
//! denominator with 1 instead of raising, so studio units (0 bedrooms)
//! always produce finite values.

use crate::data::{PropertyRecord, PropertyType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimum amenity count for the luxury flag
const LUXURY_MIN_AMENITIES: u32 = 6;
/// Minimum tier ordinal for the luxury flag
const LUXURY_MIN_TIER: u8 = 3;
/// Value flag threshold as a fraction of the median price per sqft
const VALUE_PRICE_FACTOR: f64 = 0.8;
/// Premium flag threshold as a fraction of the median price per sqft
const PREMIUM_PRICE_FACTOR: f64 = 1.2;
/// Spacious flag threshold as a fraction of the per-type median size
const SPACIOUS_SIZE_FACTOR: f64 = 1.2;

/// Divide with the 0 -> 1 denominator substitution
fn guarded_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        numerator
    } else {
        numerator / denominator
    }
}

/// Interaction features between key attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionFeatures {
    /// Size per bedroom (studios use divisor 1)
    pub size_per_bedroom: f64,
    /// Tier ordinal times metro flag
    pub tier_metro: f64,
    /// Tier ordinal times beach flag
    pub tier_beach: f64,
    /// Amenities per 1000 sqft
    pub amenity_density: f64,
    /// Furnishing ordinal times tier ordinal
    pub furnished_tier: f64,
    /// Bathrooms per bedroom (studios use divisor 1)
    pub bath_bed_ratio: f64,
    /// Metro and beach both present
    pub premium_location: f64,
}

/// Compute interaction features for one record
pub fn interaction_features(record: &PropertyRecord) -> InteractionFeatures {
    let tier = record.tier.ordinal() as f64;
    let metro = record.has_metro as u8 as f64;
    let beach = record.beach_accessible as u8 as f64;
    let bedrooms = record.bedrooms as f64;

    InteractionFeatures {
        size_per_bedroom: guarded_div(record.size_sqft, bedrooms),
        tier_metro: tier * metro,
        tier_beach: tier * beach,
        amenity_density: guarded_div(record.amenity_count as f64, record.size_sqft / 1000.0),
        furnished_tier: record.furnished.ordinal() as f64 * tier,
        bath_bed_ratio: guarded_div(record.bathrooms as f64, bedrooms),
        premium_location: if record.has_metro && record.beach_accessible {
            1.0
        } else {
            0.0
        },
    }
}

/// Polynomial features capturing non-linear size and amenity effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolynomialFeatures {
    /// Squared size
    pub size_sqft_squared: f64,
    /// Squared amenity count
    pub amenity_count_squared: f64,
    /// Square root of size
    pub size_sqft_sqrt: f64,
}

/// Compute polynomial features for one record
pub fn polynomial_features(record: &PropertyRecord) -> PolynomialFeatures {
    let amenities = record.amenity_count as f64;

    PolynomialFeatures {
        size_sqft_squared: record.size_sqft * record.size_sqft,
        amenity_count_squared: amenities * amenities,
        size_sqft_sqrt: record.size_sqft.sqrt(),
    }
}

/// Median thresholds frozen at fit time
///
/// The value/premium/spacious flags compare against medians of the training
/// batch. Freezing them here makes single-record inference independent of
/// batch composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainThresholds {
    /// Median price per sqft over the training batch
    pub median_price_per_sqft: f64,
    /// Median size per property type over the training batch
    pub median_size_by_type: HashMap<PropertyType, f64>,
    /// Median size over the whole training batch, fallback for unseen types
    pub global_median_size: f64,
}

impl DomainThresholds {
    /// Compute thresholds from a training batch
    pub fn from_batch(records: &[PropertyRecord]) -> Self {
        let prices: Vec<f64> = records.iter().map(|r| r.price_per_sqft).collect();
        let sizes: Vec<f64> = records.iter().map(|r| r.size_sqft).collect();

        let mut by_type: HashMap<PropertyType, Vec<f64>> = HashMap::new();
        for record in records {
            by_type
                .entry(record.property_type)
                .or_default()
                .push(record.size_sqft);
        }

        DomainThresholds {
            median_price_per_sqft: median(&prices),
            median_size_by_type: by_type
                .into_iter()
                .map(|(ty, sizes)| (ty, median(&sizes)))
                .collect(),
            global_median_size: median(&sizes),
        }
    }

    /// Size threshold for a property type
    fn median_size_for(&self, property_type: PropertyType) -> f64 {
        self.median_size_by_type
            .get(&property_type)
            .copied()
            .unwrap_or(self.global_median_size)
    }
}

/// Domain-knowledge indicator flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainFlags {
    /// Top tier with a rich amenity set
    pub is_luxury: f64,
    /// Price per sqft well below the market median
    pub is_value_property: f64,
    /// Price per sqft well above the market median
    pub is_premium_property: f64,
    /// Size well above the median for the property type
    pub is_spacious: f64,
    /// Pool, gym, parking and balcony all present
    pub has_complete_amenities: f64,
}

/// Compute domain flags for one record against frozen thresholds
pub fn domain_flags(record: &PropertyRecord, thresholds: &DomainThresholds) -> DomainFlags {
    let is_luxury = record.tier.ordinal() >= LUXURY_MIN_TIER
        && record.amenity_count >= LUXURY_MIN_AMENITIES;

    let median_ppsf = thresholds.median_price_per_sqft;
    let is_value = record.price_per_sqft < median_ppsf * VALUE_PRICE_FACTOR;
    let is_premium = record.price_per_sqft > median_ppsf * PREMIUM_PRICE_FACTOR;

    let is_spacious =
        record.size_sqft > thresholds.median_size_for(record.property_type) * SPACIOUS_SIZE_FACTOR;

    let complete =
        record.has_pool && record.has_gym && record.has_parking && record.has_balcony;

    DomainFlags {
        is_luxury: is_luxury as u8 as f64,
        is_value_property: is_value as u8 as f64,
        is_premium_property: is_premium as u8 as f64,
        is_spacious: is_spacious as u8 as f64,
        has_complete_amenities: complete as u8 as f64,
    }
}

/// Median of a slice (mean of the two middle values for even lengths)
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
