//! Stretch per-window scores back onto every sample position.

use tsa_math::{arange, Interp1d, InterpError};

use crate::extract::FeatureSeries;

/// Interpolate `features` linearly at sample positions `0..len`.
///
/// Positions outside the first and last window centre are extrapolated from
/// the nearest segment; a single window yields a constant series.
pub fn stretch(features: &FeatureSeries, len: usize) -> Result<Vec<f64>, InterpError> {
    let interp = Interp1d::linear(features.centers.clone(), features.scores.clone())?;
    Ok(interp.eval_many(&arange(len)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_has_one_value_per_sample() {
        let f = FeatureSeries {
            scores: vec![0.0, 1.0, 0.0],
            centers: vec![2.0, 3.0, 4.0],
        };
        let out = stretch(&f, 7).unwrap();
        assert_eq!(out, vec![-2.0, -1.0, 0.0, 1.0, 0.0, -1.0, -2.0]);
    }

    #[test]
    fn single_window_is_constant() {
        let f = FeatureSeries {
            scores: vec![1.5],
            centers: vec![6.0],
        };
        assert_eq!(stretch(&f, 4).unwrap(), vec![1.5; 4]);
    }

    #[test]
    fn empty_features_are_an_error() {
        let f = FeatureSeries {
            scores: vec![],
            centers: vec![],
        };
        assert_eq!(stretch(&f, 4).unwrap_err(), InterpError::Empty);
    }
}
