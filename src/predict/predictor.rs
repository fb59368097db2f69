//! Ensemble rent prediction
//!
//! Turns one user-facing property request into a point estimate with an
//! uncertainty band, and classifies a quoted price against that estimate.
//! The predictor holds only immutable fitted state, so concurrent prediction
//! calls need no locking.

use crate::data::{Furnished, LabelError, PropertyRecord, PropertyType, Tier};
use crate::features::{FeaturePipeline, PipelineError};
use crate::models::{to_matrix, ModelError, TrainedRegressor};
use crate::predict::bundle::ModelBundle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Baseline confidence margin as a fraction of the prediction
const BASE_MARGIN: f64 = 0.10;
/// Multiplier applied to the relative inter-model disagreement
const DISAGREEMENT_WEIGHT: f64 = 2.0;
/// Percent difference below which a listing is a great deal
const GREAT_DEAL_THRESHOLD: f64 = -5.0;
/// Percent difference above which a listing is overpriced
const OVERPRICED_THRESHOLD: f64 = 5.0;
/// Tolerance on the ensemble weight sum
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Placeholder price per sqft for not-yet-priced candidate properties
const PLACEHOLDER_PRICE_PER_SQFT: f64 = 100.0;
/// Placeholder annual rent for not-yet-priced candidate properties
const PLACEHOLDER_ANNUAL_RENT: f64 = 100_000.0;

/// Errors raised by the predictor
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Invalid request attribute: {0}")]
    Schema(#[from] LabelError),

    #[error("Ensemble weights sum to {sum}, expected 1.0")]
    InvalidWeightSum { sum: f64 },

    #[error("Negative ensemble weight {weight} for model '{name}'")]
    NegativeWeight { name: String, weight: f64 },

    #[error("Model '{name}' is missing a matching {missing}")]
    UnbalancedSuite { name: String, missing: &'static str },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// User-facing property description
///
/// Carries labels and amenity names the way a UI submits them; the predictor
/// maps these onto the canonical record the pipeline expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyRequest {
    pub neighborhood: String,
    pub property_type: String,
    pub size_sqft: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub amenity_count: u32,
    pub tier: String,
    pub furnished: String,
    pub has_metro: bool,
    pub beach_accessible: bool,
    #[serde(default)]
    pub amenities: Vec<String>,
}

/// Point prediction with an uncertainty band
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Weighted ensemble prediction (AED per year)
    pub prediction: f64,
    /// Lower confidence bound
    pub confidence_lower: f64,
    /// Upper confidence bound
    pub confidence_upper: f64,
    /// Per-model predictions
    pub individual: HashMap<String, f64>,
}

/// Classification of a listed price against the predicted fair value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketStatus {
    GreatDeal,
    FairPrice,
    Overpriced,
}

impl MarketStatus {
    /// Display label
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketStatus::GreatDeal => "Great Deal",
            MarketStatus::FairPrice => "Fair Price",
            MarketStatus::Overpriced => "Overpriced",
        }
    }

    /// Classify a percent difference between listed and predicted price
    ///
    /// Exactly -5% or +5% counts as a fair price.
    pub fn classify(percent_diff: f64) -> Self {
        if percent_diff < GREAT_DEAL_THRESHOLD {
            MarketStatus::GreatDeal
        } else if percent_diff > OVERPRICED_THRESHOLD {
            MarketStatus::Overpriced
        } else {
            MarketStatus::FairPrice
        }
    }
}

/// Listed-price comparison result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketComparison {
    /// Predicted fair annual rent
    pub predicted_price: f64,
    /// Quoted annual rent under comparison
    pub listed_price: f64,
    /// listed - predicted
    pub difference: f64,
    /// Difference as a percentage of the prediction
    pub percent_difference: f64,
    /// Market classification
    pub status: MarketStatus,
    /// Confidence band of the prediction
    pub confidence_range: (f64, f64),
}

/// Weighted sum of per-model predictions
pub fn weighted_ensemble(weights: &HashMap<String, f64>, predictions: &HashMap<String, f64>) -> f64 {
    predictions
        .iter()
        .map(|(name, prediction)| weights.get(name).copied().unwrap_or(0.0) * prediction)
        .sum()
}

/// Population standard deviation
fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Heuristic confidence margin
///
/// 10% of the prediction, widened in proportion to relative inter-model
/// disagreement. This is a dispersion heuristic, not a calibrated interval.
pub fn confidence_margin(ensemble: f64, individual: &[f64]) -> f64 {
    if ensemble == 0.0 {
        return 0.0;
    }
    let disagreement = population_std(individual) / ensemble;
    BASE_MARGIN * ensemble * (1.0 + DISAGREEMENT_WEIGHT * disagreement)
}

/// Ensemble inference engine over a loaded model bundle
pub struct RentPredictor {
    models: HashMap<String, TrainedRegressor>,
    weights: HashMap<String, f64>,
    pipeline: FeaturePipeline,
}

impl RentPredictor {
    /// Build a predictor from loaded state, validating the ensemble contract
    ///
    /// Rejects weights that do not sum to 1, negative weights, mismatched
    /// model/weight names, and an unfitted pipeline.
    pub fn new(
        models: HashMap<String, TrainedRegressor>,
        weights: HashMap<String, f64>,
        pipeline: FeaturePipeline,
    ) -> Result<Self, PredictorError> {
        // Surfaces a stale or partially built bundle at load time instead of
        // on the first request.
        pipeline.feature_names()?;

        for name in models.keys() {
            if !weights.contains_key(name) {
                return Err(PredictorError::UnbalancedSuite {
                    name: name.clone(),
                    missing: "weight",
                });
            }
        }
        for (name, &weight) in &weights {
            if !models.contains_key(name) {
                return Err(PredictorError::UnbalancedSuite {
                    name: name.clone(),
                    missing: "model",
                });
            }
            if weight < 0.0 {
                return Err(PredictorError::NegativeWeight {
                    name: name.clone(),
                    weight,
                });
            }
        }

        let sum: f64 = weights.values().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PredictorError::InvalidWeightSum { sum });
        }

        Ok(Self {
            models,
            weights,
            pipeline,
        })
    }

    /// Build a predictor from a persisted bundle
    pub fn from_bundle(bundle: ModelBundle) -> Result<Self, PredictorError> {
        Self::new(bundle.models, bundle.weights, bundle.pipeline)
    }

    /// Map a user-facing request onto the canonical record the pipeline expects
    ///
    /// Amenity-name membership sets the individual flags; tier and furnishing
    /// labels become ordinals. price_per_sqft and annual_rent receive fixed
    /// placeholders since a candidate property has no observed rent.
    pub fn prepare_input(&self, request: &PropertyRequest) -> Result<PropertyRecord, PredictorError> {
        let has_amenity = |name: &str| request.amenities.iter().any(|a| a == name);

        Ok(PropertyRecord {
            neighborhood: request.neighborhood.clone(),
            property_type: PropertyType::from_label(&request.property_type)?,
            size_sqft: request.size_sqft,
            bedrooms: request.bedrooms,
            bathrooms: request.bathrooms,
            amenity_count: request.amenity_count,
            tier: Tier::from_label(&request.tier)?,
            furnished: Furnished::from_label(&request.furnished)?,
            has_metro: request.has_metro,
            beach_accessible: request.beach_accessible,
            has_pool: has_amenity("Swimming Pool"),
            has_gym: has_amenity("Gym"),
            has_parking: has_amenity("Parking"),
            has_balcony: has_amenity("Balcony"),
            price_per_sqft: PLACEHOLDER_PRICE_PER_SQFT,
            annual_rent: Some(PLACEHOLDER_ANNUAL_RENT),
        })
    }

    /// Predict the fair annual rent for a property
    ///
    /// Every suite member predicts on the same transformed row; a failing
    /// member aborts the call, since dropping it would silently invalidate
    /// the weight normalization.
    pub fn predict(&self, request: &PropertyRequest) -> Result<PredictionResult, PredictorError> {
        let record = self.prepare_input(request)?;
        let rows = self.pipeline.transform(std::slice::from_ref(&record))?;
        let x = to_matrix(&rows)?;

        let mut individual = HashMap::with_capacity(self.models.len());
        for (name, model) in &self.models {
            let prediction = model
                .predict(&x)?
                .first()
                .copied()
                .ok_or_else(|| ModelError::PredictionFailed(format!("{name}: empty output")))?;
            individual.insert(name.clone(), prediction);
        }

        let prediction = weighted_ensemble(&self.weights, &individual);
        let spread: Vec<f64> = individual.values().copied().collect();
        let margin = confidence_margin(prediction, &spread);

        debug!(
            "Ensemble prediction {:.0} with margin {:.0} over {} models",
            prediction,
            margin,
            individual.len()
        );

        Ok(PredictionResult {
            prediction,
            confidence_lower: prediction - margin,
            confidence_upper: prediction + margin,
            individual,
        })
    }

    /// Compare a listed price against the predicted fair market value
    pub fn compare_with_market(
        &self,
        request: &PropertyRequest,
        listed_price: f64,
    ) -> Result<MarketComparison, PredictorError> {
        let result = self.predict(request)?;

        let difference = listed_price - result.prediction;
        let percent_difference = difference / result.prediction * 100.0;

        Ok(MarketComparison {
            predicted_price: result.prediction,
            listed_price,
            difference,
            percent_difference,
            status: MarketStatus::classify(percent_difference),
            confidence_range: (result.confidence_lower, result.confidence_upper),
        })
    }
}
