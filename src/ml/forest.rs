// ============================================================
// Layer 5: Random Forest Regressor
// ============================================================
// Bagged regression trees, averaged.
//
//   for each of n_trees:
//     draw n row indices with replacement (bootstrap sample)
//     grow a RegressionTree on that sample
//   predict(row) = mean over trees of tree.predict_row(row)
//
// Determinism: one master StdRng seeded from `seed` hands each
// tree its own seed, so a fixed seed and tree count always
// give the same forest.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::matrix::FeatureMatrix;
use crate::domain::traits::Regressor;
use crate::error::{PipelineError, PipelineResult};
use crate::ml::tree::{RegressionTree, TreeParams};

/// Hyperparameters for a forest. Defaults: 100 trees, seed 42,
/// unlimited depth, every feature considered at each split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees:           usize,
    pub seed:              u64,
    pub max_depth:         Option<usize>,
    pub min_samples_split: usize,
    pub max_features:      Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees:           100,
            seed:              42,
            max_depth:         None,
            min_samples_split: 2,
            max_features:      None,
        }
    }
}

impl ForestParams {
    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth:         self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features:      self.max_features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    params:     ForestParams,
    n_features: usize,
    trees:      Vec<RegressionTree>,
}

impl RandomForestRegressor {
    pub fn fit(x: &FeatureMatrix, y: &[f64], params: &ForestParams) -> PipelineResult<Self> {
        if x.is_empty() {
            return Err(PipelineError::InsufficientData("cannot fit a forest on zero rows".into()));
        }
        if x.n_rows() != y.len() {
            return Err(PipelineError::Shape(format!(
                "{} feature rows but {} targets",
                x.n_rows(),
                y.len()
            )));
        }
        if x.n_cols() == 0 {
            return Err(PipelineError::Shape("feature rows have no columns".into()));
        }
        if params.n_trees == 0 {
            return Err(PipelineError::InvalidConfig("n_trees must be at least 1".into()));
        }

        let rows = x.rows();
        let n = rows.len();
        let n_features = x.n_cols();
        let tree_params = params.tree_params();
        let mut master = StdRng::seed_from_u64(params.seed);

        let trees = (0..params.n_trees)
            .map(|_| {
                let mut rng = StdRng::seed_from_u64(master.gen());
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(rows, y, &sample, &tree_params, &mut rng)
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Grew {} trees ({} nodes total) on {} rows",
            trees.len(),
            trees.iter().map(RegressionTree::node_count).sum::<usize>(),
            n
        );

        Ok(Self { params: params.clone(), n_features, trees })
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForestRegressor {
    fn predict(&self, features: &FeatureMatrix) -> PipelineResult<Vec<f64>> {
        if !features.is_empty() && features.n_cols() != self.n_features {
            return Err(PipelineError::Shape(format!(
                "model expects {} features per row, got {}",
                self.n_features,
                features.n_cols()
            )));
        }

        let n_trees = self.trees.len() as f64;
        Ok(features
            .rows()
            .iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::matrix::Matrix;

    fn dataset() -> (FeatureMatrix, Vec<f64>) {
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i % 10) as f64, (i % 7) as f64, 1.0 + (i % 12) as f64, (i % 2) as f64])
            .collect();
        let y: Vec<f64> = rows.iter().map(|r| 100.0 * r[0] + 5.0 * r[3]).collect();
        (Matrix::from_rows(rows).unwrap(), y)
    }

    fn small() -> ForestParams {
        ForestParams { n_trees: 10, ..ForestParams::default() }
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = dataset();
        let a = RandomForestRegressor::fit(&x, &y, &small()).unwrap();
        let b = RandomForestRegressor::fit(&x, &y, &small()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.n_trees(), 10);
    }

    #[test]
    fn test_predicts_close_to_signal() {
        let (x, y) = dataset();
        let forest = RandomForestRegressor::fit(&x, &y, &small()).unwrap();
        let probe = Matrix::from_rows(vec![vec![3.0, 3.0, 4.0, 1.0]]).unwrap();
        let pred = forest.predict(&probe).unwrap();
        assert_eq!(pred.len(), 1);
        assert!((pred[0] - 305.0).abs() < 60.0, "prediction {} too far from 305", pred[0]);
    }

    #[test]
    fn test_one_prediction_per_row() {
        let (x, y) = dataset();
        let forest = RandomForestRegressor::fit(&x, &y, &small()).unwrap();
        assert_eq!(forest.predict(&x).unwrap().len(), x.n_rows());
        assert!(forest.predict(&Matrix::default()).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_width_rejected() {
        let (x, y) = dataset();
        let forest = RandomForestRegressor::fit(&x, &y, &small()).unwrap();
        let bad = Matrix::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        assert!(matches!(forest.predict(&bad), Err(PipelineError::Shape(_))));
    }

    #[test]
    fn test_empty_training_set() {
        let err = RandomForestRegressor::fit(&Matrix::default(), &[], &small()).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData(_)));
    }

    #[test]
    fn test_json_round_trip_keeps_predictions() {
        let (x, y) = dataset();
        let forest = RandomForestRegressor::fit(&x, &y, &small()).unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let back: RandomForestRegressor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.predict(&x).unwrap(), forest.predict(&x).unwrap());
    }
}
