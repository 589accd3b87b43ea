//! Isolation forest over standardized 5-dimensional metric vectors.
//!
//! Trees isolate points by recursive random axis-aligned splits, grown to
//! full isolation (singleton leaves) so path lengths reflect isolation depth
//! rather than leaf-size noise. Each split node records the observed value
//! range of its split feature; a scored point falling outside that range is
//! isolated on the spot, so points beyond the training hull get the short
//! paths they deserve even when only one field is extreme. Scores follow the
//! usual path-length formulation, shifted by a contamination quantile of the
//! training scores so that a negative decision value means "outlier" and
//! lower means more anomalous.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DIMS: usize = 5;

/// Euler-Mascheroni constant, used by the average-path-length normalizer.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Expected path length of an unsuccessful BST search on n points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        n => {
            let h = ((n - 1) as f64).ln() + EULER_GAMMA;
            2.0 * h - 2.0 * (n - 1) as f64 / n as f64
        }
    }
}

enum Node {
    Split {
        feature: usize,
        threshold: f64,
        /// Observed range of `feature` over the points at this node. A
        /// scored point outside [lo, hi] is isolated here.
        lo: f64,
        hi: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

struct Tree {
    root: Node,
}

impl Tree {
    fn build(points: &[[f64; DIMS]], rng: &mut StdRng, max_depth: usize) -> Self {
        let indices: Vec<usize> = (0..points.len()).collect();
        Self {
            root: Self::split(points, &indices, rng, 0, max_depth),
        }
    }

    fn split(
        points: &[[f64; DIMS]],
        indices: &[usize],
        rng: &mut StdRng,
        depth: usize,
        max_depth: usize,
    ) -> Node {
        if indices.len() <= 1 || depth >= max_depth {
            return Node::Leaf {
                size: indices.len(),
            };
        }

        // Only features with spread in this partition can be split on.
        let mut splittable: Vec<(usize, f64, f64)> = Vec::new();
        for feature in 0..DIMS {
            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;
            for &i in indices {
                let v = points[i][feature];
                lo = lo.min(v);
                hi = hi.max(v);
            }
            if hi > lo {
                splittable.push((feature, lo, hi));
            }
        }
        if splittable.is_empty() {
            // All remaining points are identical.
            return Node::Leaf {
                size: indices.len(),
            };
        }

        let (feature, lo, hi) = splittable[rng.gen_range(0..splittable.len())];
        let threshold = rng.gen_range(lo..hi);

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| points[i][feature] < threshold);

        Node::Split {
            feature,
            threshold,
            lo,
            hi,
            left: Box::new(Self::split(points, &left_idx, rng, depth + 1, max_depth)),
            right: Box::new(Self::split(points, &right_idx, rng, depth + 1, max_depth)),
        }
    }

    /// Path length from root to the leaf a point lands in, plus the usual
    /// adjustment for any unresolved points at that leaf. A point outside
    /// the observed range of a node's split feature isolates at that node:
    /// training data never reached there, so no further splits apply.
    fn path_length(&self, point: &[f64; DIMS]) -> f64 {
        let mut node = &self.root;
        let mut depth = 0.0;
        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    lo,
                    hi,
                    left,
                    right,
                } => {
                    let v = point[*feature];
                    if v < *lo || v > *hi {
                        return depth;
                    }
                    node = if v < *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                    depth += 1.0;
                }
            }
        }
    }
}

/// A trained isolation forest.
pub struct IsolationForest {
    trees: Vec<Tree>,
    /// Subsample size each tree was built on; normalizes path lengths.
    sample_size: usize,
    /// Contamination quantile of the training scores. Decision values are
    /// raw scores minus this offset, so negative means outlier.
    offset: f64,
}

impl IsolationForest {
    /// Train a forest on the given points. `contamination` is the expected
    /// outlier fraction of the training data and fixes the decision offset.
    pub fn fit(points: &[[f64; DIMS]], n_trees: usize, contamination: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let sample_size = points.len().min(256);
        // Grow trees to full isolation. The windows here are small enough
        // that capping depth at log2(n) leaves most leaves unresolved and
        // the resulting scores are dominated by leaf-size noise.
        let max_depth = sample_size;

        let mut trees = Vec::with_capacity(n_trees);
        for _ in 0..n_trees {
            // Sample without replacement when the window exceeds the
            // per-tree subsample size.
            let subsample: Vec<[f64; DIMS]> = if points.len() > sample_size {
                let mut pool: Vec<usize> = (0..points.len()).collect();
                (0..sample_size)
                    .map(|_| {
                        let pick = rng.gen_range(0..pool.len());
                        points[pool.swap_remove(pick)]
                    })
                    .collect()
            } else {
                points.to_vec()
            };
            trees.push(Tree::build(&subsample, &mut rng, max_depth));
        }

        let mut forest = Self {
            trees,
            sample_size,
            offset: 0.0,
        };

        // Shift scores so the contamination quantile of training data sits
        // at zero.
        let mut train_scores: Vec<f64> = points.iter().map(|p| forest.raw_score(p)).collect();
        train_scores.sort_by(|a, b| a.total_cmp(b));
        forest.offset = quantile(&train_scores, contamination);
        forest
    }

    /// Raw outlier score in [-1, 0]; lower = more anomalous.
    fn raw_score(&self, point: &[f64; DIMS]) -> f64 {
        let mean_path: f64 = self
            .trees
            .iter()
            .map(|t| t.path_length(point))
            .sum::<f64>()
            / self.trees.len() as f64;
        let norm = average_path_length(self.sample_size);
        if norm == 0.0 {
            return -0.5;
        }
        -(2f64.powf(-mean_path / norm))
    }

    /// Decision value: raw score minus the contamination offset. Negative
    /// means outlier; lower means more anomalous.
    pub fn decision(&self, point: &[f64; DIMS]) -> f64 {
        self.raw_score(point) - self.offset
    }
}

/// Linear-interpolated quantile of an ascending-sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(n: usize) -> Vec<[f64; DIMS]> {
        // Deterministic jitter around the origin, roughly [-1, 1] per axis.
        (0..n)
            .map(|i| {
                let j = i as f64;
                [
                    (j * 0.7).sin(),
                    (j * 1.3).cos(),
                    (j * 0.4).sin(),
                    (j * 2.1).cos() * 0.5,
                    (j * 0.9).sin() * 0.8,
                ]
            })
            .collect()
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // c(n) grows roughly like 2 ln(n)
        assert!(average_path_length(256) > 9.0);
        assert!(average_path_length(256) < 12.0);
    }

    #[test]
    fn test_outlier_scores_below_inlier() {
        let points = cluster(64);
        let forest = IsolationForest::fit(&points, 100, 0.1, 42);

        let inlier = [0.0, 0.0, 0.0, 0.0, 0.0];
        let outlier = [15.0, 0.0, 0.0, 0.0, 0.0];

        assert!(forest.decision(&outlier) < forest.decision(&inlier));
        assert!(forest.decision(&outlier) < 0.0, "far outlier must be flagged");
    }

    #[test]
    fn test_center_of_cluster_not_flagged() {
        let points = cluster(64);
        let forest = IsolationForest::fit(&points, 100, 0.1, 42);

        // Dead center of the training distribution must score as an inlier.
        assert!(forest.decision(&[0.0; DIMS]) > 0.0);
    }

    #[test]
    fn test_point_beyond_hull_on_every_axis_isolates_at_root() {
        let points = cluster(64);
        let forest = IsolationForest::fit(&points, 100, 0.1, 42);

        // Outside the observed range on all five axes: every tree isolates
        // it at the root, so the raw score saturates at -1 and the decision
        // is as negative as this forest can produce.
        let monster = [50.0, 50.0, 50.0, 50.0, 50.0];
        let single_axis = [15.0, 0.0, 0.0, 0.0, 0.0];
        assert!(forest.decision(&monster) < forest.decision(&single_axis));
        assert!(forest.decision(&monster) < -0.25);
    }

    #[test]
    fn test_deterministic_with_fixed_seed() {
        let points = cluster(40);
        let a = IsolationForest::fit(&points, 50, 0.1, 7);
        let b = IsolationForest::fit(&points, 50, 0.1, 7);
        let point = [3.0, -2.0, 1.0, 0.0, 0.5];
        assert_eq!(a.decision(&point), b.decision(&point));
    }

    #[test]
    fn test_quantile() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&v, 0.0), 1.0);
        assert_eq!(quantile(&v, 1.0), 5.0);
        assert_eq!(quantile(&v, 0.5), 3.0);
        assert!((quantile(&v, 0.1) - 1.4).abs() < 1e-9);
    }
}
