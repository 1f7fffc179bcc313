// ============================================================
// Layer 3: Matrix
// ============================================================
// A rectangular, row-major matrix of f64. Used both for the
// feature rows going into a model and for the per-model
// prediction columns coming back out.

use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};

/// Rectangular row-major matrix. Every row has `n_cols` entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Matrix {
    rows: Vec<Vec<f64>>,
}

/// Rows of `[file_count, day_of_week, month, is_weekday]`
pub type FeatureMatrix = Matrix;

/// One column per model, one row per input row
pub type PredictionMatrix = Matrix;

impl Matrix {
    /// Build from rows, rejecting ragged input
    pub fn from_rows(rows: Vec<Vec<f64>>) -> PipelineResult<Self> {
        if let Some(first) = rows.first() {
            let width = first.len();
            if let Some((i, bad)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
                return Err(PipelineError::Shape(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    bad.len(),
                    width
                )));
            }
        }
        Ok(Self { rows })
    }

    /// Build from equal-length columns. `n_rows` is used when there
    /// are no columns at all.
    pub fn from_columns(columns: &[Vec<f64>], n_rows: usize) -> PipelineResult<Self> {
        if let Some(bad) = columns.iter().find(|c| c.len() != n_rows) {
            return Err(PipelineError::Shape(format!(
                "column has {} values, expected {}",
                bad.len(),
                n_rows
            )));
        }
        let rows = (0..n_rows)
            .map(|i| columns.iter().map(|c| c[i]).collect())
            .collect();
        Ok(Self { rows })
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Zero for an empty matrix
    pub fn n_cols(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> Option<&[f64]> {
        self.rows.get(i).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, PipelineError::Shape(_)));
    }

    #[test]
    fn test_from_columns_transposes() {
        let m = Matrix::from_columns(&[vec![1.0, 2.0], vec![10.0, 20.0]], 2).unwrap();
        assert_eq!(m.rows(), &[vec![1.0, 10.0], vec![2.0, 20.0]]);
        assert_eq!(m.n_cols(), 2);
    }

    #[test]
    fn test_from_no_columns_keeps_row_count() {
        let m = Matrix::from_columns(&[], 3).unwrap();
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.n_cols(), 0);
    }

    #[test]
    fn test_empty_matrix() {
        let m = Matrix::from_rows(Vec::new()).unwrap();
        assert!(m.is_empty());
        assert_eq!(m.n_cols(), 0);
    }
}
