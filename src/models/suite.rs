//! Trained regressor suite
//!
//! Wraps smartcore tree regressors behind a uniform prediction interface.
//! The ensemble treats every member as an opaque `features -> number`
//! function; model family only matters at training time.

use serde::{Deserialize, Serialize};
use smartcore::ensemble::extra_trees_regressor::{
    ExtraTreesRegressor, ExtraTreesRegressorParameters,
};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use thiserror::Error;
use tracing::info;

/// Errors that can occur when training or querying a model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Shared hyperparameters for the suite members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteParams {
    /// Number of trees for the forest models
    pub n_trees: u16,
    /// Maximum depth of each tree
    pub max_depth: u16,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples required in a leaf node
    pub min_samples_leaf: usize,
    /// Seed for the randomized models
    pub seed: u64,
}

impl Default for SuiteParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 15,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

/// Build a dense matrix from feature rows
pub fn to_matrix(rows: &Vec<Vec<f64>>) -> Result<DenseMatrix<f64>, ModelError> {
    DenseMatrix::from_2d_vec(rows)
        .map_err(|e| ModelError::InvalidData(format!("Failed to create feature matrix: {:?}", e)))
}

/// A trained regressor from the model suite
#[derive(Debug, Serialize, Deserialize)]
pub enum TrainedRegressor {
    RandomForest(RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    ExtraTrees(ExtraTreesRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
    DecisionTree(DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>),
}

impl TrainedRegressor {
    /// Model family name
    pub fn kind(&self) -> &'static str {
        match self {
            TrainedRegressor::RandomForest(_) => "random forest",
            TrainedRegressor::ExtraTrees(_) => "extra trees",
            TrainedRegressor::DecisionTree(_) => "decision tree",
        }
    }

    /// Train a random forest regressor
    pub fn fit_random_forest(
        x: &DenseMatrix<f64>,
        y: &Vec<f64>,
        params: &SuiteParams,
    ) -> Result<Self, ModelError> {
        let model = RandomForestRegressor::fit(
            x,
            y,
            RandomForestRegressorParameters::default()
                .with_n_trees(params.n_trees.into())
                .with_max_depth(params.max_depth)
                .with_min_samples_split(params.min_samples_split)
                .with_min_samples_leaf(params.min_samples_leaf)
                .with_seed(params.seed),
        )
        .map_err(|e| ModelError::TrainingFailed(format!("{:?}", e)))?;

        Ok(TrainedRegressor::RandomForest(model))
    }

    /// Train an extra trees regressor
    pub fn fit_extra_trees(
        x: &DenseMatrix<f64>,
        y: &Vec<f64>,
        params: &SuiteParams,
    ) -> Result<Self, ModelError> {
        let model = ExtraTreesRegressor::fit(
            x,
            y,
            ExtraTreesRegressorParameters::default()
                .with_n_trees(params.n_trees.into())
                .with_max_depth(params.max_depth)
                .with_min_samples_split(params.min_samples_split)
                .with_min_samples_leaf(params.min_samples_leaf)
                .with_seed(params.seed),
        )
        .map_err(|e| ModelError::TrainingFailed(format!("{:?}", e)))?;

        Ok(TrainedRegressor::ExtraTrees(model))
    }

    /// Train a single decision tree regressor
    pub fn fit_decision_tree(
        x: &DenseMatrix<f64>,
        y: &Vec<f64>,
        params: &SuiteParams,
    ) -> Result<Self, ModelError> {
        let model = DecisionTreeRegressor::fit(
            x,
            y,
            DecisionTreeRegressorParameters::default()
                .with_max_depth(params.max_depth)
                .with_min_samples_split(params.min_samples_split)
                .with_min_samples_leaf(params.min_samples_leaf),
        )
        .map_err(|e| ModelError::TrainingFailed(format!("{:?}", e)))?;

        Ok(TrainedRegressor::DecisionTree(model))
    }

    /// Predict targets for a feature matrix
    pub fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>, ModelError> {
        let result = match self {
            TrainedRegressor::RandomForest(model) => model.predict(x),
            TrainedRegressor::ExtraTrees(model) => model.predict(x),
            TrainedRegressor::DecisionTree(model) => model.predict(x),
        };

        result.map_err(|e| ModelError::PredictionFailed(format!("{:?}", e)))
    }

    /// Predict the target for a single feature row
    pub fn predict_one(&self, row: &[f64]) -> Result<f64, ModelError> {
        let x = to_matrix(&vec![row.to_vec()])?;
        let predictions = self.predict(&x)?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| ModelError::PredictionFailed("Empty prediction output".to_string()))
    }
}

/// Regression evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// R-squared score
    pub r2: f64,
    /// Mean absolute percentage error, in percent
    pub mape: f64,
}

impl ModelMetrics {
    /// Calculate regression metrics over paired true/predicted values
    pub fn regression(y_true: &[f64], y_pred: &[f64]) -> Result<Self, ModelError> {
        let n = y_true.len();
        if n == 0 || n != y_pred.len() {
            return Err(ModelError::InvalidData(format!(
                "Mismatched evaluation lengths: {} true vs {} predicted",
                n,
                y_pred.len()
            )));
        }

        let mae = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).abs())
            .sum::<f64>()
            / n as f64;

        let mse = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).powi(2))
            .sum::<f64>()
            / n as f64;

        let mean_true = y_true.iter().sum::<f64>() / n as f64;
        let ss_tot: f64 = y_true.iter().map(|t| (t - mean_true).powi(2)).sum();
        let ss_res: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).powi(2))
            .sum();
        let r2 = if ss_tot != 0.0 {
            1.0 - ss_res / ss_tot
        } else {
            0.0
        };

        let mape = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, _)| **t != 0.0)
            .map(|(t, p)| ((t - p) / t).abs())
            .sum::<f64>()
            / n as f64
            * 100.0;

        Ok(Self {
            mae,
            rmse: mse.sqrt(),
            r2,
            mape,
        })
    }
}

/// Log metrics for one suite member
pub fn log_metrics(name: &str, metrics: &ModelMetrics) {
    info!(
        "{}: MAE={:.0}, RMSE={:.0}, R2={:.4}, MAPE={:.2}%",
        name, metrics.mae, metrics.rmse, metrics.r2, metrics.mape
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_perfect_fit() {
        let y = vec![100.0, 200.0, 300.0];
        let metrics = ModelMetrics::regression(&y, &y).unwrap();

        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.r2, 1.0);
        assert_eq!(metrics.mape, 0.0);
    }

    #[test]
    fn test_metrics_known_values() {
        let y_true = vec![100.0, 200.0];
        let y_pred = vec![110.0, 180.0];
        let metrics = ModelMetrics::regression(&y_true, &y_pred).unwrap();

        assert!((metrics.mae - 15.0).abs() < 1e-9);
        // MAPE = (10/100 + 20/200) / 2 * 100 = 10%
        assert!((metrics.mape - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_metrics_rejects_mismatched_lengths() {
        assert!(ModelMetrics::regression(&[1.0], &[1.0, 2.0]).is_err());
        assert!(ModelMetrics::regression(&[], &[]).is_err());
    }

    #[test]
    fn test_decision_tree_fit_and_predict() {
        // Simple linear relationship; a deep tree memorizes it
        let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let y: Vec<f64> = rows.iter().map(|r| r[0] * 10.0 + r[1]).collect();

        let x = to_matrix(&rows).unwrap();
        let model = TrainedRegressor::fit_decision_tree(&x, &y, &SuiteParams::default()).unwrap();

        let prediction = model.predict_one(&[20.0, 1.0]).unwrap();
        assert!((prediction - 201.0).abs() < 30.0);
        assert_eq!(model.kind(), "decision tree");
    }
}
