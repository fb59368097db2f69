//! Analytical dataset loading
//!
//! Reads the cleaned, merged listing dataset produced by the upstream data
//! preparation stage. One CSV row per rental listing with labeled categorical
//! columns and 0/1 flag columns.

use crate::data::types::{Furnished, LabelError, PropertyRecord, PropertyType, Tier};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors raised while loading the analytical dataset
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed CSV record: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row}: {source}")]
    Label {
        row: usize,
        #[source]
        source: LabelError,
    },

    #[error("Row {row}: non-positive size_sqft {value}")]
    InvalidSize { row: usize, value: f64 },
}

/// Raw CSV row as written by the data preparation stage
#[derive(Debug, Deserialize)]
struct RawListing {
    neighborhood: String,
    property_type: String,
    size_sqft: f64,
    bedrooms: u32,
    bathrooms: u32,
    amenity_count: u32,
    tier: String,
    furnished: String,
    has_metro: u8,
    beach_accessible: u8,
    has_pool: u8,
    has_gym: u8,
    has_parking: u8,
    has_balcony: u8,
    price_per_sqft: f64,
    annual_rent: f64,
}

impl RawListing {
    fn into_record(self, row: usize) -> Result<PropertyRecord, DataError> {
        let label = |source| DataError::Label { row, source };

        if self.size_sqft <= 0.0 {
            return Err(DataError::InvalidSize {
                row,
                value: self.size_sqft,
            });
        }

        Ok(PropertyRecord {
            neighborhood: self.neighborhood,
            property_type: PropertyType::from_label(&self.property_type).map_err(label)?,
            size_sqft: self.size_sqft,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            amenity_count: self.amenity_count,
            tier: Tier::from_label(&self.tier).map_err(label)?,
            furnished: Furnished::from_label(&self.furnished).map_err(label)?,
            has_metro: self.has_metro != 0,
            beach_accessible: self.beach_accessible != 0,
            has_pool: self.has_pool != 0,
            has_gym: self.has_gym != 0,
            has_parking: self.has_parking != 0,
            has_balcony: self.has_balcony != 0,
            price_per_sqft: self.price_per_sqft,
            annual_rent: Some(self.annual_rent),
        })
    }
}

/// Load training records from an analytical dataset CSV
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<PropertyRecord>, DataError> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut records = Vec::new();

    for (i, row) in reader.deserialize::<RawListing>().enumerate() {
        records.push(row?.into_record(i + 1)?);
    }

    info!(
        "Loaded {} listings from {}",
        records.len(),
        path.as_ref().display()
    );

    Ok(records)
}
