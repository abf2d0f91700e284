//! Seeded k-means clustering.
//!
//! Greedy k-means++ seeding followed by Lloyd iterations, restarted
//! `n_init` times; the run with the lowest inertia wins. All randomness
//! comes from a `StdRng` seeded from the parameters, so a fit is a pure
//! function of its input.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised by clustering.
#[derive(Debug, Error, PartialEq)]
pub enum ClusterError {
    #[error("cannot cluster an empty sample set")]
    Empty,
    #[error("row {row} has {actual} features, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("cluster count must be positive")]
    ZeroClusters,
    #[error("{samples} samples cannot form {clusters} clusters")]
    TooFewSamples { samples: usize, clusters: usize },
}

/// k-means hyper-parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansParams {
    /// Number of clusters.
    pub n_clusters: usize,
    /// Independent restarts; the lowest-inertia run is kept.
    pub n_init: usize,
    /// Lloyd iteration cap per restart.
    pub max_iter: usize,
    /// Relative convergence tolerance (scaled by mean feature variance).
    pub tol: f64,
    /// RNG seed.
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            n_clusters: 8,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            seed: 42,
        }
    }
}

/// Result of a k-means fit.
#[derive(Debug, Clone, Serialize)]
pub struct KMeansFit {
    pub centers: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
    pub inertia: f64,
    pub iterations: usize,
}

impl KMeansFit {
    /// Number of members per cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.centers.len()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

/// k-means estimator.
#[derive(Debug, Clone, Default)]
pub struct KMeans {
    params: KMeansParams,
}

impl KMeans {
    pub fn new(params: KMeansParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &KMeansParams {
        &self.params
    }

    /// Cluster `data` (one row per sample).
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<KMeansFit, ClusterError> {
        let k = self.params.n_clusters;
        if k == 0 {
            return Err(ClusterError::ZeroClusters);
        }
        if data.is_empty() {
            return Err(ClusterError::Empty);
        }
        let dims = data[0].len();
        for (row, sample) in data.iter().enumerate() {
            if sample.len() != dims {
                return Err(ClusterError::RaggedRows {
                    row,
                    expected: dims,
                    actual: sample.len(),
                });
            }
        }
        if data.len() < k {
            return Err(ClusterError::TooFewSamples {
                samples: data.len(),
                clusters: k,
            });
        }

        let tol = self.params.tol * mean_variance(data, dims);
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut best: Option<KMeansFit> = None;

        for _ in 0..self.params.n_init.max(1) {
            let seeds = kmeans_plus_plus(data, k, &mut rng);
            let fit = lloyd(data, seeds, self.params.max_iter, tol);
            let better = match &best {
                Some(b) => fit.inertia < b.inertia,
                None => true,
            };
            if better {
                best = Some(fit);
            }
        }

        best.ok_or(ClusterError::Empty)
    }
}

/// Number of pairwise-distinct rows (bitwise comparison).
pub fn distinct_rows(data: &[Vec<f64>]) -> usize {
    data.iter()
        .map(|row| row.iter().map(|v| v.to_bits()).collect::<Vec<u64>>())
        .collect::<HashSet<_>>()
        .len()
}

/// Squared Euclidean distance.
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn mean_variance(data: &[Vec<f64>], dims: usize) -> f64 {
    if dims == 0 {
        return 0.0;
    }
    let n = data.len() as f64;
    let mut total = 0.0;
    for d in 0..dims {
        let mean = data.iter().map(|row| row[d]).sum::<f64>() / n;
        total += data.iter().map(|row| (row[d] - mean).powi(2)).sum::<f64>() / n;
    }
    total / dims as f64
}

fn nearest(sample: &[f64], centers: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centers.iter().enumerate() {
        let d = squared_distance(sample, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

/// Greedy k-means++: each new centre is the best of a few D²-weighted draws.
fn kmeans_plus_plus(data: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = data.len();
    let local_trials = 2 + (k as f64).ln().floor() as usize;

    let first = rng.random_range(0..n);
    let mut centers = vec![data[first].clone()];
    let mut closest: Vec<f64> = data
        .iter()
        .map(|x| squared_distance(x, &centers[0]))
        .collect();
    let mut potential: f64 = closest.iter().sum();

    while centers.len() < k {
        let pick = if potential > 0.0 {
            let mut chosen = 0;
            let mut chosen_potential = f64::INFINITY;
            for _ in 0..local_trials {
                let candidate = sample_weighted(&closest, potential, rng);
                let trial_potential: f64 = data
                    .iter()
                    .zip(&closest)
                    .map(|(x, &d)| d.min(squared_distance(x, &data[candidate])))
                    .sum();
                if trial_potential < chosen_potential {
                    chosen = candidate;
                    chosen_potential = trial_potential;
                }
            }
            chosen
        } else {
            // every sample already coincides with a centre
            0
        };

        let center = data[pick].clone();
        for (d, x) in closest.iter_mut().zip(data) {
            *d = d.min(squared_distance(x, &center));
        }
        potential = closest.iter().sum();
        centers.push(center);
    }
    centers
}

fn sample_weighted(weights: &[f64], total: f64, rng: &mut StdRng) -> usize {
    let target = rng.random::<f64>() * total;
    let mut acc = 0.0;
    for (i, w) in weights.iter().enumerate() {
        acc += w;
        if acc > target {
            return i;
        }
    }
    weights.len() - 1
}

fn lloyd(data: &[Vec<f64>], mut centers: Vec<Vec<f64>>, max_iter: usize, tol: f64) -> KMeansFit {
    let k = centers.len();
    let dims = data[0].len();
    let mut labels = vec![0usize; data.len()];
    let mut iterations = 0;

    for _ in 0..max_iter.max(1) {
        iterations += 1;
        let mut dists = vec![0.0; data.len()];
        for (i, x) in data.iter().enumerate() {
            let (label, d) = nearest(x, &centers);
            labels[i] = label;
            dists[i] = d;
        }

        let mut sums = vec![vec![0.0; dims]; k];
        let mut counts = vec![0usize; k];
        for (x, &label) in data.iter().zip(&labels) {
            counts[label] += 1;
            for (s, v) in sums[label].iter_mut().zip(x) {
                *s += v;
            }
        }

        let mut taken: HashSet<usize> = HashSet::new();
        let mut shift = 0.0;
        for c in 0..k {
            let updated = if counts[c] > 0 {
                sums[c].iter().map(|s| s / counts[c] as f64).collect()
            } else {
                // relocate an empty cluster onto the worst-fitting sample
                let far = farthest_unused(&dists, &taken);
                taken.insert(far);
                data[far].clone()
            };
            shift += squared_distance(&updated, &centers[c]);
            centers[c] = updated;
        }

        if shift <= tol {
            break;
        }
    }

    let mut inertia = 0.0;
    for (i, x) in data.iter().enumerate() {
        let (label, d) = nearest(x, &centers);
        labels[i] = label;
        inertia += d;
    }

    KMeansFit {
        centers,
        labels,
        inertia,
        iterations,
    }
}

fn farthest_unused(dists: &[f64], taken: &HashSet<usize>) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, &d) in dists.iter().enumerate() {
        if !taken.contains(&i) && d > best.1 {
            best = (i, d);
        }
    }
    best.0
}
