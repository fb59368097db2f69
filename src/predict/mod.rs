//! Prediction serving module
//!
//! This module provides:
//! - The persisted fitted bundle (models, weights, pipeline state)
//! - The ensemble predictor with confidence bands and market comparison

pub mod bundle;
pub mod predictor;

pub use bundle::{BundleError, ModelBundle};
pub use predictor::{
    MarketComparison, MarketStatus, PredictionResult, PredictorError, PropertyRequest,
    RentPredictor,
};
