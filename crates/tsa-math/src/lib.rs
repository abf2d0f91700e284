//! Numerical kernels for windowed time-series anomaly scoring.
//!
//! Everything here operates on plain `f64` slices: statistics, linear
//! interpolation, windowing, spectrograms and cluster-based outlier scores.

pub mod math;

pub use math::cblof::{Cblof, CblofModel, CblofParams};
pub use math::interp::{arange, linspace, Interp1d, InterpError};
pub use math::kmeans::{ClusterError, KMeans, KMeansFit, KMeansParams};
pub use math::spectral::{spectrogram, SpectralError, Spectrogram};
pub use math::stats::{diff, mean, population_std, zscore};
pub use math::window::{hann, sliding_windows};
