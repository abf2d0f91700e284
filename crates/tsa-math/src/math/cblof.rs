//! Cluster-based local outlier factor (CBLOF).
//!
//! Samples are clustered with k-means, clusters are split into "large" and
//! "small" by size, and every sample is scored by its distance to a large
//! centroid:
//! - members of a large cluster: distance to their own centroid
//! - members of a small cluster: distance to the nearest large centroid
//!
//! The split point is the first rank `i` (clusters sorted by size,
//! descending) where either the top `i` clusters hold at least `alpha` of
//! all samples, or cluster `i - 1` is at least `beta` times larger than
//! cluster `i`. A rank satisfying both rules wins over one satisfying only
//! the `alpha` rule, which wins over one satisfying only the `beta` rule.

use serde::{Deserialize, Serialize};

use super::kmeans::{distinct_rows, squared_distance, ClusterError, KMeans, KMeansFit, KMeansParams};

/// CBLOF hyper-parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CblofParams {
    /// Requested number of clusters.
    pub n_clusters: usize,
    /// Share of samples the large clusters must cover (0..1).
    pub alpha: f64,
    /// Minimum size ratio between the last large and first small cluster.
    pub beta: f64,
    /// Multiply each score by the size of the sample's cluster.
    pub use_weights: bool,
    /// Expected outlier share, used for the binary labels.
    pub contamination: f64,
    /// k-means restarts.
    pub n_init: usize,
    /// k-means iteration cap.
    pub max_iter: usize,
    /// k-means relative tolerance.
    pub tol: f64,
    /// k-means seed.
    pub seed: u64,
}

impl Default for CblofParams {
    fn default() -> Self {
        Self {
            n_clusters: 8,
            alpha: 0.9,
            beta: 5.0,
            use_weights: false,
            contamination: 0.1,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            seed: 42,
        }
    }
}

/// A fitted CBLOF model.
#[derive(Debug, Clone, Serialize)]
pub struct CblofModel {
    /// Cluster count actually used (never more than the distinct samples).
    pub n_clusters: usize,
    /// Cluster ids considered large, biggest first.
    pub large_clusters: Vec<usize>,
    /// Cluster ids considered small, biggest first.
    pub small_clusters: Vec<usize>,
    /// False when neither rule produced a split and every cluster was kept large.
    pub separated: bool,
    /// One outlier score per training sample.
    pub decision_scores: Vec<f64>,
    /// Score at the `1 - contamination` quantile.
    pub threshold: f64,
    /// 1 for samples scoring above `threshold`.
    pub labels: Vec<u8>,
    /// Underlying clustering.
    pub clustering: KMeansFit,
}

/// CBLOF estimator.
#[derive(Debug, Clone, Default)]
pub struct Cblof {
    params: CblofParams,
}

impl Cblof {
    pub fn new(params: CblofParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CblofParams {
        &self.params
    }

    /// Fit the model and score every row of `data`.
    ///
    /// The cluster count is clamped to the number of distinct rows so that
    /// short or flat signals still cluster.
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<CblofModel, ClusterError> {
        if self.params.n_clusters == 0 {
            return Err(ClusterError::ZeroClusters);
        }
        if data.is_empty() {
            return Err(ClusterError::Empty);
        }
        let n_clusters = self.params.n_clusters.min(distinct_rows(data)).max(1);

        let kmeans = KMeans::new(KMeansParams {
            n_clusters,
            n_init: self.params.n_init,
            max_iter: self.params.max_iter,
            tol: self.params.tol,
            seed: self.params.seed,
        });
        let clustering = kmeans.fit(data)?;
        let sizes = clustering.cluster_sizes();

        let (split, separated) = split_point(&sizes, data.len(), self.params.alpha, self.params.beta);
        let mut order: Vec<usize> = (0..sizes.len()).collect();
        order.sort_by(|a, b| sizes[*b].cmp(&sizes[*a]));
        let large_clusters = order[..split].to_vec();
        let small_clusters = order[split..].to_vec();

        let mut is_large = vec![false; sizes.len()];
        for &c in &large_clusters {
            is_large[c] = true;
        }

        let decision_scores: Vec<f64> = data
            .iter()
            .zip(&clustering.labels)
            .map(|(x, &label)| {
                let dist = if is_large[label] {
                    squared_distance(x, &clustering.centers[label]).sqrt()
                } else {
                    large_clusters
                        .iter()
                        .map(|&c| squared_distance(x, &clustering.centers[c]).sqrt())
                        .fold(f64::INFINITY, f64::min)
                };
                if self.params.use_weights {
                    dist * sizes[label] as f64
                } else {
                    dist
                }
            })
            .collect();

        let threshold = percentile(&decision_scores, 1.0 - self.params.contamination);
        let labels = decision_scores
            .iter()
            .map(|&s| u8::from(s > threshold))
            .collect();

        Ok(CblofModel {
            n_clusters,
            large_clusters,
            small_clusters,
            separated,
            decision_scores,
            threshold,
            labels,
            clustering,
        })
    }
}

/// Rank separating large from small clusters, and whether a rule fired.
///
/// Falls back to "all clusters large" when no rank satisfies either rule
/// (for instance with a single cluster).
fn split_point(sizes: &[usize], n_samples: usize, alpha: f64, beta: f64) -> (usize, bool) {
    let mut sorted = sizes.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let mut alpha_hits = Vec::new();
    let mut beta_hits = Vec::new();
    for i in 1..sorted.len() {
        let covered: usize = sorted[..i].iter().sum();
        if covered as f64 >= n_samples as f64 * alpha {
            alpha_hits.push(i);
        }
        if sorted[i - 1] as f64 / sorted[i] as f64 >= beta {
            beta_hits.push(i);
        }
    }

    if let Some(&i) = alpha_hits.iter().find(|i| beta_hits.contains(i)) {
        return (i, true);
    }
    if let Some(&i) = alpha_hits.first() {
        return (i, true);
    }
    if let Some(&i) = beta_hits.first() {
        return (i, true);
    }
    (sorted.len(), false)
}

/// Linear-interpolated quantile `q` in [0, 1]. NaN scores sort last.
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
