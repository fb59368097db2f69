//! Persisted fitted bundle
//!
//! Everything inference needs, produced once by training: the trained model
//! suite, the ensemble weights and the fitted feature pipeline. Serialized as
//! JSON; the predictor only requires that the structures survive intact.

use crate::features::FeaturePipeline;
use crate::models::TrainedRegressor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors raised while persisting or restoring a bundle
#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Bundle I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bundle serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Trained models, ensemble weights and fitted pipeline state
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelBundle {
    /// Model name to trained regressor
    pub models: HashMap<String, TrainedRegressor>,
    /// Model name to ensemble weight
    pub weights: HashMap<String, f64>,
    /// Fitted feature pipeline
    pub pipeline: FeaturePipeline,
    /// When training produced this bundle
    pub trained_at: DateTime<Utc>,
}

impl ModelBundle {
    /// Assemble a bundle from freshly trained parts
    pub fn new(
        models: HashMap<String, TrainedRegressor>,
        weights: HashMap<String, f64>,
        pipeline: FeaturePipeline,
    ) -> Self {
        Self {
            models,
            weights,
            pipeline,
            trained_at: Utc::now(),
        }
    }

    /// Write the bundle to disk
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), BundleError> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer(BufWriter::new(file), self)?;

        info!("Saved model bundle to {}", path.as_ref().display());
        Ok(())
    }

    /// Read a bundle from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BundleError> {
        let file = File::open(path.as_ref())?;
        let bundle: ModelBundle = serde_json::from_reader(BufReader::new(file))?;

        info!(
            "Loaded model bundle from {} ({} models, trained {})",
            path.as_ref().display(),
            bundle.models.len(),
            bundle.trained_at.format("%Y-%m-%d %H:%M")
        );
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Furnished, PropertyRecord, PropertyType, Tier};
    use crate::models::{ensemble_weights, evaluate_suite, train_model_suite, SuiteParams};
    use crate::predict::{PropertyRequest, RentPredictor};

    fn training_batch() -> Vec<PropertyRecord> {
        (0..40)
            .map(|i| {
                let size = 800.0 + (i % 8) as f64 * 100.0;
                PropertyRecord {
                    neighborhood: if i % 2 == 0 { "DIFC" } else { "Al Barsha" }.to_string(),
                    property_type: PropertyType::OneBr,
                    size_sqft: size,
                    bedrooms: 1,
                    bathrooms: 1,
                    amenity_count: 3,
                    tier: Tier::MidMarket,
                    furnished: Furnished::Unfurnished,
                    has_metro: i % 2 == 0,
                    beach_accessible: false,
                    has_pool: false,
                    has_gym: true,
                    has_parking: true,
                    has_balcony: false,
                    price_per_sqft: 90.0,
                    annual_rent: Some(40_000.0 + size * 30.0),
                }
            })
            .collect()
    }

    #[test]
    fn test_bundle_round_trip_preserves_predictions() {
        let mut pipeline = crate::features::FeaturePipeline::new();
        let (x, y, _) = pipeline.fit_transform(&training_batch()).unwrap();

        let params = SuiteParams {
            n_trees: 10,
            ..SuiteParams::default()
        };
        let models = train_model_suite(&x, &y, &params).unwrap();
        let scores = evaluate_suite(&models, &x, &y).unwrap();
        let weights = ensemble_weights(&scores);

        let bundle = ModelBundle::new(models, weights, pipeline);

        let file = tempfile::NamedTempFile::new().unwrap();
        bundle.save(file.path()).unwrap();
        let restored = ModelBundle::load(file.path()).unwrap();

        let request = PropertyRequest {
            neighborhood: "DIFC".to_string(),
            property_type: "1BR".to_string(),
            size_sqft: 950.0,
            bedrooms: 1,
            bathrooms: 1,
            amenity_count: 3,
            tier: "Mid-Market".to_string(),
            furnished: "Unfurnished".to_string(),
            has_metro: true,
            beach_accessible: false,
            amenities: vec!["Gym".to_string(), "Parking".to_string()],
        };

        let before = RentPredictor::from_bundle(bundle)
            .unwrap()
            .predict(&request)
            .unwrap();
        let after = RentPredictor::from_bundle(restored)
            .unwrap()
            .predict(&request)
            .unwrap();

        assert_eq!(before.prediction, after.prediction);
        assert_eq!(before.individual, after.individual);
    }
}
