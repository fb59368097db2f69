//! Core data types for rental property records
//!
//! This module defines the property attributes consumed by the feature
//! pipeline, plus the ordinal/categorical vocabularies used across the crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when parsing categorical labels
#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Unknown property type: {0}")]
    UnknownPropertyType(String),

    #[error("Unknown tier label: {0}")]
    UnknownTier(String),

    #[error("Unknown furnishing label: {0}")]
    UnknownFurnished(String),
}

/// Property type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Studio,
    OneBr,
    TwoBr,
    ThreeBr,
    Villa,
}

impl PropertyType {
    /// Dataset label for this property type
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Studio => "Studio",
            PropertyType::OneBr => "1BR",
            PropertyType::TwoBr => "2BR",
            PropertyType::ThreeBr => "3BR",
            PropertyType::Villa => "Villa",
        }
    }

    /// Parse a dataset label
    pub fn from_label(label: &str) -> Result<Self, LabelError> {
        match label {
            "Studio" => Ok(PropertyType::Studio),
            "1BR" => Ok(PropertyType::OneBr),
            "2BR" => Ok(PropertyType::TwoBr),
            "3BR" => Ok(PropertyType::ThreeBr),
            "Villa" => Ok(PropertyType::Villa),
            other => Err(LabelError::UnknownPropertyType(other.to_string())),
        }
    }
}

/// Neighborhood desirability tier (ordinal, Budget < Mid-Market < Premium < Luxury)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Budget,
    MidMarket,
    Premium,
    Luxury,
}

impl Tier {
    /// Ordinal value in 1-4
    pub fn ordinal(&self) -> u8 {
        match self {
            Tier::Budget => 1,
            Tier::MidMarket => 2,
            Tier::Premium => 3,
            Tier::Luxury => 4,
        }
    }

    /// Parse a dataset label
    pub fn from_label(label: &str) -> Result<Self, LabelError> {
        match label {
            "Budget" => Ok(Tier::Budget),
            "Mid-Market" => Ok(Tier::MidMarket),
            "Premium" => Ok(Tier::Premium),
            "Luxury" => Ok(Tier::Luxury),
            other => Err(LabelError::UnknownTier(other.to_string())),
        }
    }
}

/// Furnishing level (ordinal 0-2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Furnished {
    Unfurnished,
    Semi,
    Fully,
}

impl Furnished {
    /// Ordinal value in 0-2
    pub fn ordinal(&self) -> u8 {
        match self {
            Furnished::Unfurnished => 0,
            Furnished::Semi => 1,
            Furnished::Fully => 2,
        }
    }

    /// Parse a dataset label
    pub fn from_label(label: &str) -> Result<Self, LabelError> {
        match label {
            "Unfurnished" => Ok(Furnished::Unfurnished),
            "Semi-Furnished" => Ok(Furnished::Semi),
            "Furnished" => Ok(Furnished::Fully),
            other => Err(LabelError::UnknownFurnished(other.to_string())),
        }
    }
}

/// One rental unit's observable attributes
///
/// `annual_rent` is the training target and is only present on fit-time
/// records; inference-time records carry a placeholder instead (see the
/// predictor's input preparation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Neighborhood name
    pub neighborhood: String,
    /// Property type category
    pub property_type: PropertyType,
    /// Unit size in square feet (positive)
    pub size_sqft: f64,
    /// Number of bedrooms (0 for studios)
    pub bedrooms: u32,
    /// Number of bathrooms
    pub bathrooms: u32,
    /// Total count of listed amenities
    pub amenity_count: u32,
    /// Neighborhood desirability tier
    pub tier: Tier,
    /// Furnishing level
    pub furnished: Furnished,
    /// Metro station within reach
    pub has_metro: bool,
    /// Beach access
    pub beach_accessible: bool,
    /// Swimming pool
    pub has_pool: bool,
    /// Gym
    pub has_gym: bool,
    /// Parking
    pub has_parking: bool,
    /// Balcony
    pub has_balcony: bool,
    /// Annual rent divided by size (AED per sqft)
    pub price_per_sqft: f64,
    /// Annual rent in AED, present on training records only
    pub annual_rent: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Budget < Tier::Luxury);
        assert_eq!(Tier::Premium.ordinal(), 3);
        assert_eq!(Tier::from_label("Mid-Market").unwrap(), Tier::MidMarket);
        assert!(Tier::from_label("Ultra").is_err());
    }

    #[test]
    fn test_property_type_labels() {
        for label in ["Studio", "1BR", "2BR", "3BR", "Villa"] {
            let parsed = PropertyType::from_label(label).unwrap();
            assert_eq!(parsed.as_str(), label);
        }
    }

    #[test]
    fn test_furnished_labels() {
        assert_eq!(Furnished::from_label("Furnished").unwrap().ordinal(), 2);
        assert_eq!(Furnished::from_label("Unfurnished").unwrap().ordinal(), 0);
    }
}
