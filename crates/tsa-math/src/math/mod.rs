//! Core math modules.

pub mod cblof;
pub mod interp;
pub mod kmeans;
pub mod spectral;
pub mod stats;
pub mod window;
