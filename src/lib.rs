//! Rental price prediction with a multi-model weighted ensemble
//!
//! This library turns raw rental listings into a fixed-width feature matrix
//! through a deterministic transformation pipeline, trains a suite of tree
//! regressors on it, and serves ensemble predictions with a heuristic
//! confidence band plus a listed-price market comparison.
//!
//! # Modules
//!
//! - [`data`] - Property record types and analytical dataset loading
//! - [`features`] - Derived features and the fitted transformation pipeline
//! - [`models`] - Regressor suite, training and ensemble weighting
//! - [`predict`] - Bundle persistence and the ensemble predictor
//!
//! # Example
//!
//! ```rust,no_run
//! use rent_ensemble::data::load_records;
//! use rent_ensemble::features::FeaturePipeline;
//! use rent_ensemble::models::{
//!     ensemble_weights, evaluate_suite, train_model_suite, train_validation_split, SuiteParams,
//! };
//! use rent_ensemble::predict::{ModelBundle, PropertyRequest, RentPredictor};
//!
//! fn main() -> anyhow::Result<()> {
//!     // 1. Fit the feature pipeline on the analytical dataset
//!     let records = load_records("data/analytical_dataset.csv")?;
//!     let mut pipeline = FeaturePipeline::new();
//!     let (x, y, _names) = pipeline.fit_transform(&records)?;
//!
//!     // 2. Train the suite and weight it by validation error
//!     let ((x_train, y_train), (x_val, y_val)) = train_validation_split(&x, &y, 0.8, 42);
//!     let models = train_model_suite(&x_train, &y_train, &SuiteParams::default())?;
//!     let scores = evaluate_suite(&models, &x_val, &y_val)?;
//!     let weights = ensemble_weights(&scores);
//!
//!     // 3. Persist and serve
//!     let bundle = ModelBundle::new(models, weights, pipeline);
//!     bundle.save("models/bundle.json")?;
//!
//!     let predictor = RentPredictor::from_bundle(ModelBundle::load("models/bundle.json")?)?;
//!     let request: PropertyRequest = serde_json::from_str("{ /* property details */ }")?;
//!     let result = predictor.predict(&request)?;
//!     println!("Fair rent: {:.0} AED/year", result.prediction);
//!
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod features;
pub mod models;
pub mod predict;

// Re-export commonly used items at the crate level
pub use data::{load_records, Furnished, PropertyRecord, PropertyType, Tier};
pub use features::{FeaturePipeline, PipelineError};
pub use models::{ModelError, ModelMetrics, SuiteParams, TrainedRegressor};
pub use predict::{
    MarketComparison, MarketStatus, ModelBundle, PredictionResult, PredictorError,
    PropertyRequest, RentPredictor,
};
