//! Machine learning models module
//!
//! This module provides:
//! - The trained regressor suite over smartcore models
//! - Training, evaluation and inverse-MAPE ensemble weighting

pub mod suite;
pub mod training;

pub use suite::{to_matrix, ModelError, ModelMetrics, SuiteParams, TrainedRegressor};
pub use training::{
    ensemble_weights, evaluate_suite, train_model_suite, train_validation_split, MODEL_NAMES,
};
