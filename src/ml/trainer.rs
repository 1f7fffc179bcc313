// ============================================================
// Layer 5: Trainer / Evaluator
// ============================================================
// Wires prepared rows into the forest and scores it.
//
//   features = [file_count, day_of_week, month, is_weekday]
//   target   = total_records
//
// The MSE on the held-out rows is reported only. Nothing here
// loops on it: no early stopping, no parameter search.

use crate::domain::matrix::{FeatureMatrix, Matrix};
use crate::domain::prepared_row::PreparedRow;
use crate::domain::traits::Regressor;
use crate::error::{PipelineError, PipelineResult};
use crate::ml::forest::{ForestParams, RandomForestRegressor};

/// Score of a model on a held-out set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub mse:  f64,
    pub rows: usize,
}

pub fn feature_matrix(rows: &[PreparedRow]) -> PipelineResult<FeatureMatrix> {
    Matrix::from_rows(rows.iter().map(PreparedRow::features).collect())
}

pub fn targets(rows: &[PreparedRow]) -> Vec<f64> {
    rows.iter().map(PreparedRow::target).collect()
}

/// Fit a forest on the training rows
pub fn train(rows: &[PreparedRow], params: &ForestParams) -> PipelineResult<RandomForestRegressor> {
    if rows.is_empty() {
        return Err(PipelineError::InsufficientData(
            "training set is empty; widen the input range or shrink the test window".into(),
        ));
    }

    tracing::info!("Fitting {} trees on {} rows (seed {})", params.n_trees, rows.len(), params.seed);
    RandomForestRegressor::fit(&feature_matrix(rows)?, &targets(rows), params)
}

/// Predict the held-out rows and compute their mean squared error
pub fn evaluate(model: &dyn Regressor, rows: &[PreparedRow]) -> PipelineResult<Evaluation> {
    if rows.is_empty() {
        return Err(PipelineError::InsufficientData("test set is empty; nothing to score".into()));
    }

    let predictions = model.predict(&feature_matrix(rows)?)?;
    let mse = mean_squared_error(&targets(rows), &predictions)?;
    Ok(Evaluation { mse, rows: rows.len() })
}

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> PipelineResult<f64> {
    if actual.len() != predicted.len() {
        return Err(PipelineError::Shape(format!(
            "{} actual values but {} predictions",
            actual.len(),
            predicted.len()
        )));
    }
    if actual.is_empty() {
        return Err(PipelineError::InsufficientData("no values to score".into()));
    }

    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p) * (a - p))
        .sum();
    Ok(sum / actual.len() as f64)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prepared_row::Cycle;
    use chrono::{Datelike, Duration, NaiveDate};

    fn rows(n: usize) -> Vec<PreparedRow> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let date = start + Duration::days(i as i64);
                let dow = date.weekday().num_days_from_monday();
                let file_count = 1 + (i % 5) as u64;
                PreparedRow {
                    date,
                    cycle: if i % 2 == 0 { Cycle::Am } else { Cycle::Pm },
                    file_count,
                    total_records: file_count * 100,
                    day_of_week: dow,
                    month: date.month(),
                    is_weekday: dow < 5,
                }
            })
            .collect()
    }

    /// Predicts the first feature column back unchanged
    struct Echo;

    impl Regressor for Echo {
        fn predict(&self, features: &FeatureMatrix) -> PipelineResult<Vec<f64>> {
            Ok(features.rows().iter().map(|r| r[0]).collect())
        }
    }

    #[test]
    fn test_mse_values() {
        assert_eq!(mean_squared_error(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap(), 0.0);
        assert_eq!(mean_squared_error(&[0.0, 0.0], &[2.0, 4.0]).unwrap(), 10.0);
    }

    #[test]
    fn test_mse_length_mismatch() {
        assert!(matches!(mean_squared_error(&[1.0], &[]), Err(PipelineError::Shape(_))));
    }

    #[test]
    fn test_feature_matrix_shape() {
        let m = feature_matrix(&rows(6)).unwrap();
        assert_eq!(m.n_rows(), 6);
        assert_eq!(m.n_cols(), 4);
        assert!(feature_matrix(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_evaluate_with_known_model() {
        // Echo predicts file_count; target is file_count * 100
        let data = rows(3); // file_count 1, 2, 3
        let eval = evaluate(&Echo, &data).unwrap();
        let expected = (99.0f64.powi(2) + 198.0f64.powi(2) + 297.0f64.powi(2)) / 3.0;
        assert!((eval.mse - expected).abs() < 1e-9);
        assert_eq!(eval.rows, 3);
    }

    #[test]
    fn test_train_then_evaluate() {
        let data = rows(60);
        let params = ForestParams { n_trees: 20, ..ForestParams::default() };
        let model = train(&data[..45], &params).unwrap();
        let eval = evaluate(&model, &data[45..]).unwrap();
        // total_records is an exact function of file_count
        assert!(eval.mse < 1.0, "mse {} unexpectedly high", eval.mse);
    }

    #[test]
    fn test_empty_sets_are_insufficient() {
        let params = ForestParams::default();
        assert!(matches!(train(&[], &params), Err(PipelineError::InsufficientData(_))));
        assert!(matches!(evaluate(&Echo, &[]), Err(PipelineError::InsufficientData(_))));
    }
}
