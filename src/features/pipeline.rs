//! Feature transformation pipeline
//!
//! Maps raw property records to fixed-width numeric feature rows. Fitting
//! computes the categorical encoder, neighborhood rent statistics and domain
//! thresholds exactly once; inference reuses that state read-only, so a
//! fitted pipeline can serve concurrent transforms without locking.

use crate::data::PropertyRecord;
use crate::features::derive::{
    domain_flags, interaction_features, polynomial_features, DomainThresholds,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Bayesian smoothing constant: pseudo-observations of the global mean
/// blended into every neighborhood average.
const SMOOTHING_M: f64 = 30.0;

/// Numeric feature columns in their canonical order. One-hot columns for
/// {neighborhood, property_type} follow these in the assembled row.
const NUMERIC_FEATURES: [&str; 30] = [
    "size_sqft",
    "bedrooms",
    "bathrooms",
    "amenity_count",
    "tier",
    "furnished",
    "has_metro",
    "beach_accessible",
    "price_per_sqft",
    "has_pool",
    "has_gym",
    "has_parking",
    "has_balcony",
    "size_per_bedroom",
    "tier_metro_interaction",
    "tier_beach_interaction",
    "amenity_density",
    "furnished_tier",
    "bath_bed_ratio",
    "premium_location",
    "size_sqft_squared",
    "amenity_count_squared",
    "size_sqft_sqrt",
    "is_luxury",
    "is_value_property",
    "is_premium_property",
    "is_spacious",
    "has_complete_amenities",
    "neighborhood_rent_avg",
    "neighborhood_rent_std",
];

/// Errors raised by the feature pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Pipeline has not been fitted; call fit_transform first")]
    NotFitted,

    #[error("Cannot fit on an empty record batch")]
    EmptyBatch,

    #[error("Record {index} has no annual_rent target")]
    MissingTarget { index: usize },
}

/// One-hot encoder for the two categorical attributes
///
/// Categories are captured in sorted order at fit time. Unknown categories at
/// inference encode to an all-zero indicator group rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    neighborhoods: Vec<String>,
    property_types: Vec<String>,
}

impl CategoricalEncoder {
    /// Capture the category vocabularies of a training batch
    pub fn fit(records: &[PropertyRecord]) -> Self {
        let mut neighborhoods: Vec<String> =
            records.iter().map(|r| r.neighborhood.clone()).collect();
        neighborhoods.sort();
        neighborhoods.dedup();

        let mut property_types: Vec<String> = records
            .iter()
            .map(|r| r.property_type.as_str().to_string())
            .collect();
        property_types.sort();
        property_types.dedup();

        CategoricalEncoder {
            neighborhoods,
            property_types,
        }
    }

    /// Indicator column names, neighborhoods first
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .neighborhoods
            .iter()
            .map(|n| format!("neighborhood_{}", n))
            .collect();
        names.extend(
            self.property_types
                .iter()
                .map(|t| format!("property_type_{}", t)),
        );
        names
    }

    /// Encode one record as indicator columns
    pub fn encode(&self, record: &PropertyRecord) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.neighborhoods.len() + self.property_types.len());

        let mut matched = false;
        for neighborhood in &self.neighborhoods {
            let hit = neighborhood == &record.neighborhood;
            matched |= hit;
            row.push(hit as u8 as f64);
        }
        if !matched {
            warn!(
                "Unknown neighborhood '{}' encoded as zero indicators",
                record.neighborhood
            );
        }

        let type_label = record.property_type.as_str();
        let mut matched = false;
        for property_type in &self.property_types {
            let hit = property_type == type_label;
            matched |= hit;
            row.push(hit as u8 as f64);
        }
        if !matched {
            warn!(
                "Unknown property type '{}' encoded as zero indicators",
                type_label
            );
        }

        row
    }

    /// Total number of indicator columns
    pub fn num_columns(&self) -> usize {
        self.neighborhoods.len() + self.property_types.len()
    }
}

/// Per-neighborhood rent statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NeighborhoodEntry {
    count: usize,
    mean: f64,
    /// Sample standard deviation; None when fewer than two observations
    std: Option<f64>,
}

/// Neighborhood rent statistics for target encoding
///
/// Computed once at fit time, consulted read-only afterwards. Unknown
/// neighborhoods fall back to the global mean and standard deviation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborhoodStats {
    entries: HashMap<String, NeighborhoodEntry>,
    global_mean: f64,
    global_std: f64,
}

impl NeighborhoodStats {
    /// Compute statistics from a training batch; every record must carry a
    /// target.
    fn fit(records: &[PropertyRecord], targets: &[f64]) -> Self {
        let mut grouped: HashMap<String, Vec<f64>> = HashMap::new();
        for (record, &rent) in records.iter().zip(targets.iter()) {
            grouped
                .entry(record.neighborhood.clone())
                .or_default()
                .push(rent);
        }

        let entries = grouped
            .into_iter()
            .map(|(neighborhood, rents)| {
                let count = rents.len();
                let mean = rents.iter().sum::<f64>() / count as f64;
                let std = sample_std(&rents, mean);
                (neighborhood, NeighborhoodEntry { count, mean, std })
            })
            .collect();

        let global_mean = targets.iter().sum::<f64>() / targets.len() as f64;
        let global_std = sample_std(targets, global_mean).unwrap_or(0.0);

        NeighborhoodStats {
            entries,
            global_mean,
            global_std,
        }
    }

    /// Bayesian-smoothed average rent for a neighborhood
    ///
    /// `(count * mean + m * global_mean) / (count + m)` with m = 30, so
    /// sparse neighborhoods lean toward the global mean. Unknown
    /// neighborhoods return the global mean.
    pub fn smoothed_avg(&self, neighborhood: &str) -> f64 {
        match self.entries.get(neighborhood) {
            Some(entry) => {
                let count = entry.count as f64;
                (count * entry.mean + SMOOTHING_M * self.global_mean) / (count + SMOOTHING_M)
            }
            None => self.global_mean,
        }
    }

    /// Raw rent standard deviation for a neighborhood, falling back to the
    /// global value when absent or undefined.
    pub fn rent_std(&self, neighborhood: &str) -> f64 {
        self.entries
            .get(neighborhood)
            .and_then(|entry| entry.std)
            .unwrap_or(self.global_std)
    }

    /// Global mean rent over the training batch
    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    /// Number of neighborhoods observed at fit time
    pub fn num_neighborhoods(&self) -> usize {
        self.entries.len()
    }
}

/// Sample standard deviation (n - 1 denominator); None for fewer than two values
fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Fitted pipeline state, immutable after `fit_transform`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FittedState {
    encoder: CategoricalEncoder,
    stats: NeighborhoodStats,
    thresholds: DomainThresholds,
    feature_names: Vec<String>,
}

/// Deterministic raw-record to feature-row transformation
///
/// Holds no state until fitted; after `fit_transform` the encoder,
/// neighborhood statistics and domain thresholds are frozen on the instance.
/// Independently fitted pipelines do not interfere.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeaturePipeline {
    fitted: Option<FittedState>,
}

impl FeaturePipeline {
    /// Create an unfitted pipeline
    pub fn new() -> Self {
        FeaturePipeline { fitted: None }
    }

    /// Fit the pipeline on a training batch and transform it
    ///
    /// This is the single point where the encoder, neighborhood statistics
    /// and domain thresholds become fitted. Returns the feature matrix, the
    /// target vector and the canonical feature-name list whose order every
    /// later `transform` reproduces.
    pub fn fit_transform(
        &mut self,
        records: &[PropertyRecord],
    ) -> Result<(Vec<Vec<f64>>, Vec<f64>, Vec<String>), PipelineError> {
        if records.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }

        let targets: Vec<f64> = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                record
                    .annual_rent
                    .ok_or(PipelineError::MissingTarget { index })
            })
            .collect::<Result<_, _>>()?;

        let thresholds = DomainThresholds::from_batch(records);
        let stats = NeighborhoodStats::fit(records, &targets);
        let encoder = CategoricalEncoder::fit(records);

        let mut feature_names: Vec<String> =
            NUMERIC_FEATURES.iter().map(|s| s.to_string()).collect();
        feature_names.extend(encoder.feature_names());

        info!(
            "Fitted feature pipeline: {} records, {} neighborhoods, {} features",
            records.len(),
            stats.num_neighborhoods(),
            feature_names.len()
        );

        self.fitted = Some(FittedState {
            encoder,
            stats,
            thresholds,
            feature_names: feature_names.clone(),
        });

        // Row assembly goes through the same path inference uses, so the
        // fit-time and serve-time column contracts cannot drift apart.
        let matrix = self.transform(records)?;

        Ok((matrix, targets, feature_names))
    }

    /// Transform records with the fitted state
    ///
    /// Applies interactions, polynomials and domain flags fresh, performs the
    /// neighborhood statistics lookup, and reuses the fitted encoder. Row
    /// width and column order match the fit-time feature-name list.
    pub fn transform(
        &self,
        records: &[PropertyRecord],
    ) -> Result<Vec<Vec<f64>>, PipelineError> {
        let state = self.fitted.as_ref().ok_or(PipelineError::NotFitted)?;

        debug!("Transforming {} records", records.len());

        Ok(records
            .iter()
            .map(|record| Self::assemble_row(record, state))
            .collect())
    }

    /// Canonical feature names captured at fit time
    pub fn feature_names(&self) -> Result<&[String], PipelineError> {
        self.fitted
            .as_ref()
            .map(|state| state.feature_names.as_slice())
            .ok_or(PipelineError::NotFitted)
    }

    /// Whether `fit_transform` has run
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Neighborhood statistics captured at fit time
    pub fn neighborhood_stats(&self) -> Result<&NeighborhoodStats, PipelineError> {
        self.fitted
            .as_ref()
            .map(|state| &state.stats)
            .ok_or(PipelineError::NotFitted)
    }

    /// Assemble one feature row in the canonical column order
    fn assemble_row(record: &PropertyRecord, state: &FittedState) -> Vec<f64> {
        let interactions = interaction_features(record);
        let polynomials = polynomial_features(record);
        let flags = domain_flags(record, &state.thresholds);

        let mut row =
            Vec::with_capacity(NUMERIC_FEATURES.len() + state.encoder.num_columns());

        // Original attributes
        row.push(record.size_sqft);
        row.push(record.bedrooms as f64);
        row.push(record.bathrooms as f64);
        row.push(record.amenity_count as f64);
        row.push(record.tier.ordinal() as f64);
        row.push(record.furnished.ordinal() as f64);
        row.push(record.has_metro as u8 as f64);
        row.push(record.beach_accessible as u8 as f64);
        row.push(record.price_per_sqft);
        row.push(record.has_pool as u8 as f64);
        row.push(record.has_gym as u8 as f64);
        row.push(record.has_parking as u8 as f64);
        row.push(record.has_balcony as u8 as f64);

        // Interactions
        row.push(interactions.size_per_bedroom);
        row.push(interactions.tier_metro);
        row.push(interactions.tier_beach);
        row.push(interactions.amenity_density);
        row.push(interactions.furnished_tier);
        row.push(interactions.bath_bed_ratio);
        row.push(interactions.premium_location);

        // Polynomials
        row.push(polynomials.size_sqft_squared);
        row.push(polynomials.amenity_count_squared);
        row.push(polynomials.size_sqft_sqrt);

        // Domain flags
        row.push(flags.is_luxury);
        row.push(flags.is_value_property);
        row.push(flags.is_premium_property);
        row.push(flags.is_spacious);
        row.push(flags.has_complete_amenities);

        // Target encoding
        row.push(state.stats.smoothed_avg(&record.neighborhood));
        row.push(state.stats.rent_std(&record.neighborhood));

        // One-hot columns
        row.extend(state.encoder.encode(record));

        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Furnished, PropertyType, Tier};

    fn record(neighborhood: &str, rent: f64) -> PropertyRecord {
        PropertyRecord {
            neighborhood: neighborhood.to_string(),
            property_type: PropertyType::TwoBr,
            size_sqft: 1200.0,
            bedrooms: 2,
            bathrooms: 2,
            amenity_count: 5,
            tier: Tier::Premium,
            furnished: Furnished::Semi,
            has_metro: true,
            beach_accessible: false,
            has_pool: true,
            has_gym: false,
            has_parking: true,
            has_balcony: true,
            price_per_sqft: rent / 1200.0,
            annual_rent: Some(rent),
        }
    }

    fn training_batch() -> Vec<PropertyRecord> {
        let mut records = vec![
            record("Dubai Marina", 140_000.0),
            record("Dubai Marina", 150_000.0),
            record("Dubai Marina", 160_000.0),
            record("Deira", 50_000.0),
            record("Deira", 60_000.0),
        ];
        records[3].property_type = PropertyType::Studio;
        records[3].bedrooms = 0;
        records[3].size_sqft = 450.0;
        records
    }

    #[test]
    fn test_transform_matches_feature_names() {
        let mut pipeline = FeaturePipeline::new();
        let (matrix, targets, names) = pipeline.fit_transform(&training_batch()).unwrap();

        assert_eq!(targets.len(), 5);
        for row in &matrix {
            assert_eq!(row.len(), names.len());
        }

        // 30 numeric + 2 neighborhoods + 2 property types
        assert_eq!(names.len(), 34);
        assert_eq!(names[0], "size_sqft");
        assert_eq!(names[29], "neighborhood_rent_std");
        assert_eq!(names[30], "neighborhood_Deira");
        assert_eq!(names[31], "neighborhood_Dubai Marina");

        // Unseen neighborhood and property type still produce a full-width row
        let mut unseen = record("Palm Jumeirah", 0.0);
        unseen.annual_rent = None;
        unseen.property_type = PropertyType::Villa;
        let rows = pipeline.transform(&[unseen]).unwrap();
        assert_eq!(rows[0].len(), names.len());
        // All indicator columns are zero
        assert!(rows[0][30..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let pipeline = FeaturePipeline::new();
        assert!(matches!(
            pipeline.transform(&[record("Deira", 50_000.0)]),
            Err(PipelineError::NotFitted)
        ));
        assert!(matches!(
            pipeline.feature_names(),
            Err(PipelineError::NotFitted)
        ));
    }

    #[test]
    fn test_fit_requires_targets() {
        let mut records = training_batch();
        records[2].annual_rent = None;

        let mut pipeline = FeaturePipeline::new();
        assert!(matches!(
            pipeline.fit_transform(&records),
            Err(PipelineError::MissingTarget { index: 2 })
        ));

        assert!(matches!(
            FeaturePipeline::new().fit_transform(&[]),
            Err(PipelineError::EmptyBatch)
        ));
    }

    #[test]
    fn test_bayesian_smoothing_concrete_case() {
        // 30 observations at 150,000 in one neighborhood, 30 at 50,000 in the
        // other; global mean is 100,000. The smoothed average for the first
        // must be (30 * 150000 + 30 * 100000) / 60 = 125,000.
        let mut records = Vec::new();
        for _ in 0..30 {
            records.push(record("Dubai Marina", 150_000.0));
        }
        for _ in 0..30 {
            records.push(record("Deira", 50_000.0));
        }

        let mut pipeline = FeaturePipeline::new();
        pipeline.fit_transform(&records).unwrap();
        let stats = pipeline.neighborhood_stats().unwrap();

        assert!((stats.global_mean() - 100_000.0).abs() < 1e-9);
        assert!((stats.smoothed_avg("Dubai Marina") - 125_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_smoothing_limits() {
        let mut records = Vec::new();
        for _ in 0..3000 {
            records.push(record("Dubai Marina", 150_000.0));
        }
        records.push(record("Deira", 50_000.0));

        let mut pipeline = FeaturePipeline::new();
        pipeline.fit_transform(&records).unwrap();
        let stats = pipeline.neighborhood_stats().unwrap();

        // Large sample converges to the raw neighborhood mean
        assert!((stats.smoothed_avg("Dubai Marina") - 150_000.0).abs() < 1500.0);
        // Unknown neighborhood degrades to the global mean
        assert!((stats.smoothed_avg("Palm Jumeirah") - stats.global_mean()).abs() < 1e-9);
        // Single-observation neighborhood has no defined std; falls back
        assert!(stats.rent_std("Deira") > 0.0);
        assert_eq!(stats.rent_std("Deira"), stats.rent_std("Palm Jumeirah"));
    }

    #[test]
    fn test_single_record_transform_matches_batch() {
        let mut pipeline = FeaturePipeline::new();
        let batch = training_batch();
        pipeline.fit_transform(&batch).unwrap();

        let together = pipeline.transform(&batch).unwrap();
        for (i, record) in batch.iter().enumerate() {
            let alone = pipeline.transform(std::slice::from_ref(record)).unwrap();
            assert_eq!(alone[0], together[i]);
        }
    }

    #[test]
    fn test_independent_pipelines_do_not_interfere() {
        let mut first = FeaturePipeline::new();
        first.fit_transform(&training_batch()).unwrap();

        let mut second = FeaturePipeline::new();
        second
            .fit_transform(&[record("Business Bay", 90_000.0), record("DIFC", 110_000.0)])
            .unwrap();

        assert_eq!(first.feature_names().unwrap().len(), 34);
        // Second pipeline saw different vocabularies
        assert_ne!(
            first.feature_names().unwrap(),
            second.feature_names().unwrap()
        );
        // First pipeline's stats are untouched by fitting the second
        assert!((first.neighborhood_stats().unwrap().global_mean() - 112_000.0).abs() < 1.0);
    }
}
