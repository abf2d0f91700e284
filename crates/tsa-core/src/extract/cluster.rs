//! Outlier scores from clustering sliding windows.
//!
//! Every stride-`step` window of the signal is a sample for CBLOF; windows
//! far from any large cluster score high.

use serde::Serialize;
use tracing::debug;
use tsa_config::ClusteringParams;
use tsa_math::{linspace, sliding_windows, Cblof, CblofParams};

use super::{ExtractError, FeatureExtractor, FeatureSeries, Imputation};

/// CBLOF-based feature extractor.
#[derive(Debug, Clone, Serialize)]
pub struct OutlierClustering {
    pub windowsize: usize,
    pub step: usize,
    pub params: CblofParams,
}

impl OutlierClustering {
    pub fn new(windowsize: usize, step: usize, clustering: &ClusteringParams) -> Self {
        Self {
            windowsize,
            step: step.max(1),
            params: CblofParams {
                n_clusters: clustering.cluster_count(windowsize),
                alpha: clustering.alpha,
                beta: clustering.beta,
                use_weights: clustering.use_weights,
                contamination: clustering.contamination,
                n_init: clustering.n_init,
                max_iter: clustering.max_iter,
                tol: clustering.tol,
                seed: clustering.seed,
            },
        }
    }
}

impl FeatureExtractor for OutlierClustering {
    fn name(&self) -> &'static str {
        "cblof"
    }

    fn imputation(&self) -> Imputation {
        Imputation::Interpolate
    }

    fn extract(&self, signal: &[f64]) -> Result<FeatureSeries, ExtractError> {
        let windows = sliding_windows(signal, self.windowsize, self.step);
        if windows.is_empty() {
            return Err(ExtractError::SignalTooShort {
                len: signal.len(),
                windowsize: self.windowsize,
            });
        }

        let model = Cblof::new(self.params.clone()).fit(&windows)?;
        debug!(
            windows = windows.len(),
            clusters = model.n_clusters,
            large = model.large_clusters.len(),
            separated = model.separated,
            max_score = model.decision_scores.iter().cloned().fold(f64::NAN, f64::max),
            "clustered windows"
        );

        // centres run from half a window in to half a window before the end
        let half = (self.windowsize / 2) as f64;
        let stop = (signal.len() - self.windowsize / 2 + 1) as f64;
        Ok(FeatureSeries {
            centers: linspace(half, stop, windows.len()),
            scores: model.decision_scores,
        })
    }
}
