// ============================================================
// Layer 5: Regression Tree (CART)
// ============================================================
// A binary regression tree grown greedily:
//
//   - at each node, draw `max_features` candidate features
//   - for each candidate, sort the node's samples by that feature
//     and scan every midpoint between distinct neighbouring values
//   - keep the split with the lowest summed squared error
//     SSE(left) + SSE(right), using running sums so each feature
//     costs one sort plus one linear scan
//   - a node becomes a leaf (predicting its mean target) when it
//     has fewer than `min_samples_split` samples, reached
//     `max_depth`, has constant targets, or has no usable split
//
// Nodes live in a flat Vec; children are referenced by index so
// the whole tree serialises as plain JSON.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth:         Option<usize>,
    pub min_samples_split: usize,
    /// Features tried per node; `None` tries all of them
    pub max_features:      Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth:         None,
            min_samples_split: 2,
            max_features:      None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature:   usize,
    threshold: f64,
    sse:       f64,
}

impl RegressionTree {
    /// Grow a tree on the rows of `x` selected by `sample` (duplicates
    /// allowed, which is how bootstrap weights show up).
    ///
    /// Callers guarantee `sample` is non-empty, every index is in range,
    /// and every row of `x` has the same width.
    pub fn fit<R: Rng>(
        x:      &[Vec<f64>],
        y:      &[f64],
        sample: &[usize],
        params: &TreeParams,
        rng:    &mut R,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let mut grower = Grower { x, y, params, rng };
        grower.grow(&mut tree.nodes, sample.to_vec(), 0);
        tree
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Walk from the root to a leaf. `row` must be as wide as the training rows.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

struct Grower<'a, R: Rng> {
    x:      &'a [Vec<f64>],
    y:      &'a [f64],
    params: &'a TreeParams,
    rng:    &'a mut R,
}

impl<R: Rng> Grower<'_, R> {
    /// Append the subtree for `sample` and return its root index
    fn grow(&mut self, nodes: &mut Vec<Node>, sample: Vec<usize>, depth: usize) -> usize {
        let n = sample.len() as f64;
        let mean = sample.iter().map(|&i| self.y[i]).sum::<f64>() / n;

        let at_depth_limit = self.params.max_depth.is_some_and(|d| depth >= d);
        let constant = sample.iter().all(|&i| self.y[i] == self.y[sample[0]]);

        if sample.len() < self.params.min_samples_split.max(2) || at_depth_limit || constant {
            nodes.push(Node::Leaf { value: mean });
            return nodes.len() - 1;
        }

        let Some(best) = self.best_split(&sample) else {
            nodes.push(Node::Leaf { value: mean });
            return nodes.len() - 1;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| self.x[i][best.feature] <= best.threshold);

        // Reserve our slot, then fill it once both children exist
        let idx = nodes.len();
        nodes.push(Node::Leaf { value: mean });
        let left_idx = self.grow(nodes, left, depth + 1);
        let right_idx = self.grow(nodes, right, depth + 1);
        nodes[idx] = Node::Split {
            feature:   best.feature,
            threshold: best.threshold,
            left:      left_idx,
            right:     right_idx,
        };
        idx
    }

    fn best_split(&mut self, sample: &[usize]) -> Option<BestSplit> {
        let n_features = self.x[sample[0]].len();
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(&mut *self.rng);
        let k = self.params.max_features.unwrap_or(n_features).clamp(1, n_features);
        features.truncate(k);

        let total_sum: f64 = sample.iter().map(|&i| self.y[i]).sum();
        let total_sq: f64 = sample.iter().map(|&i| self.y[i] * self.y[i]).sum();
        let n = sample.len();

        let mut best: Option<BestSplit> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

        for &f in &features {
            pairs.clear();
            pairs.extend(sample.iter().map(|&i| (self.x[i][f], self.y[i])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for k in 1..n {
                let (v_prev, y_prev) = pairs[k - 1];
                left_sum += y_prev;
                left_sq += y_prev * y_prev;

                let v_next = pairs[k].0;
                if v_prev >= v_next {
                    continue;
                }

                let n_left = k as f64;
                let n_right = (n - k) as f64;
                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / n_left)
                    + (right_sq - right_sum * right_sum / n_right);

                if best.as_ref().map_or(true, |b| sse < b.sse) {
                    best = Some(BestSplit {
                        feature:   f,
                        threshold: v_prev + (v_next - v_prev) / 2.0,
                        sse,
                    });
                }
            }
        }

        best
    }
}
