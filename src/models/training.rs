//! Suite training and ensemble weighting
//!
//! Trains every member of the model suite on a transformed feature matrix,
//! scores each on a held-out validation split, and derives ensemble weights
//! from inverse validation MAPE so the most accurate models dominate the
//! weighted prediction.

use crate::models::suite::{
    log_metrics, to_matrix, ModelError, ModelMetrics, SuiteParams, TrainedRegressor,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use tracing::info;

/// Suite member names, fixed by the training harness
pub const MODEL_NAMES: [&str; 3] = ["Random Forest", "Extra Trees", "Decision Tree"];

/// Shuffle and split a feature matrix and target vector
///
/// Returns ((train_x, train_y), (validation_x, validation_y)).
pub fn train_validation_split(
    x: &[Vec<f64>],
    y: &[f64],
    train_ratio: f64,
    seed: u64,
) -> ((Vec<Vec<f64>>, Vec<f64>), (Vec<Vec<f64>>, Vec<f64>)) {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let split = (x.len() as f64 * train_ratio) as usize;

    let collect = |slice: &[usize]| -> (Vec<Vec<f64>>, Vec<f64>) {
        (
            slice.iter().map(|&i| x[i].clone()).collect(),
            slice.iter().map(|&i| y[i]).collect(),
        )
    };

    (collect(&indices[..split]), collect(&indices[split..]))
}

/// Train all suite members on the training split
pub fn train_model_suite(
    x_train: &Vec<Vec<f64>>,
    y_train: &Vec<f64>,
    params: &SuiteParams,
) -> Result<HashMap<String, TrainedRegressor>, ModelError> {
    if x_train.is_empty() {
        return Err(ModelError::InvalidData("Empty training split".to_string()));
    }

    let x = to_matrix(x_train)?;

    info!(
        "Training model suite on {} samples with {} features",
        x_train.len(),
        x_train[0].len()
    );

    let mut models = HashMap::new();
    models.insert(
        "Random Forest".to_string(),
        TrainedRegressor::fit_random_forest(&x, y_train, params)?,
    );
    models.insert(
        "Extra Trees".to_string(),
        TrainedRegressor::fit_extra_trees(&x, y_train, params)?,
    );
    models.insert(
        "Decision Tree".to_string(),
        TrainedRegressor::fit_decision_tree(&x, y_train, params)?,
    );

    info!("Model suite training completed");

    Ok(models)
}

/// Score every suite member on the validation split
pub fn evaluate_suite(
    models: &HashMap<String, TrainedRegressor>,
    x_val: &Vec<Vec<f64>>,
    y_val: &[f64],
) -> Result<HashMap<String, ModelMetrics>, ModelError> {
    let x = to_matrix(x_val)?;

    let mut scores = HashMap::new();
    for (name, model) in models {
        let predictions = model.predict(&x)?;
        let metrics = ModelMetrics::regression(y_val, &predictions)?;
        log_metrics(name, &metrics);
        scores.insert(name.clone(), metrics);
    }

    Ok(scores)
}

/// Derive ensemble weights as normalized inverse validation MAPE
///
/// Lower validation error yields a higher weight; weights are non-negative
/// and sum to 1.
pub fn ensemble_weights(scores: &HashMap<String, ModelMetrics>) -> HashMap<String, f64> {
    let inverse: HashMap<String, f64> = scores
        .iter()
        .map(|(name, metrics)| {
            // A perfect validation fit would divide by zero; cap the
            // contribution instead.
            let mape = metrics.mape.max(1e-6);
            (name.clone(), 1.0 / mape)
        })
        .collect();

    let total: f64 = inverse.values().sum();

    inverse
        .into_iter()
        .map(|(name, value)| (name, value / total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_data(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..n)
            .map(|i| vec![i as f64, ((i * 7) % 13) as f64])
            .collect();
        let y: Vec<f64> = x.iter().map(|r| 50_000.0 + r[0] * 400.0 + r[1] * 250.0).collect();
        (x, y)
    }

    #[test]
    fn test_split_proportions_and_coverage() {
        let (x, y) = synthetic_data(100);
        let ((x_train, y_train), (x_val, y_val)) = train_validation_split(&x, &y, 0.8, 42);

        assert_eq!(x_train.len(), 80);
        assert_eq!(x_val.len(), 20);
        assert_eq!(y_train.len(), 80);
        assert_eq!(y_val.len(), 20);

        // Same seed reproduces the same split
        let ((x_train2, _), _) = train_validation_split(&x, &y, 0.8, 42);
        assert_eq!(x_train, x_train2);
    }

    #[test]
    fn test_inverse_mape_weights_sum_to_one() {
        let mut scores = HashMap::new();
        for (name, mape) in [("A", 5.0), ("B", 10.0), ("C", 20.0)] {
            scores.insert(
                name.to_string(),
                ModelMetrics {
                    mae: 0.0,
                    rmse: 0.0,
                    r2: 0.0,
                    mape,
                },
            );
        }

        let weights = ensemble_weights(&scores);
        let total: f64 = weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);

        // Inverse 5:10:20 normalizes to 4/7, 2/7, 1/7
        assert!((weights["A"] - 4.0 / 7.0).abs() < 1e-9);
        assert!((weights["B"] - 2.0 / 7.0).abs() < 1e-9);
        assert!((weights["C"] - 1.0 / 7.0).abs() < 1e-9);
        assert!(weights["A"] > weights["B"]);
    }

    #[test]
    fn test_train_and_evaluate_suite() {
        let (x, y) = synthetic_data(120);
        let ((x_train, y_train), (x_val, y_val)) = train_validation_split(&x, &y, 0.8, 7);

        let params = SuiteParams {
            n_trees: 20,
            ..SuiteParams::default()
        };
        let models = train_model_suite(&x_train, &y_train, &params).unwrap();
        assert_eq!(models.len(), MODEL_NAMES.len());

        let scores = evaluate_suite(&models, &x_val, &y_val).unwrap();
        for name in MODEL_NAMES {
            assert!(scores[name].mape.is_finite());
        }

        let weights = ensemble_weights(&scores);
        let total: f64 = weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_training_split_rejected() {
        assert!(train_model_suite(&vec![], &vec![], &SuiteParams::default()).is_err());
    }
}
