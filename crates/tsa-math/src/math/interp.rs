//! Piecewise-linear interpolation with extrapolation.
//!
//! Evaluation follows the classic "search sorted, clip to an interior
//! segment" scheme: points left of the first knot extend the first segment,
//! points right of the last knot extend the last one.

use thiserror::Error;

/// Errors raised while building an interpolant.
#[derive(Debug, Error, PartialEq)]
pub enum InterpError {
    #[error("interpolant needs at least one knot")]
    Empty,
    #[error("knot count mismatch: {xs} x values, {ys} y values")]
    LengthMismatch { xs: usize, ys: usize },
    #[error("knots must be strictly increasing (index {index})")]
    NotIncreasing { index: usize },
}

/// Linear interpolant over strictly increasing knots.
#[derive(Debug, Clone)]
pub struct Interp1d {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Interp1d {
    /// Build a linear interpolant with extrapolation at both ends.
    ///
    /// `ys` may contain NaN; it propagates into every segment touching it.
    pub fn linear(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, InterpError> {
        if xs.len() != ys.len() {
            return Err(InterpError::LengthMismatch {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        if xs.is_empty() {
            return Err(InterpError::Empty);
        }
        for (i, w) in xs.windows(2).enumerate() {
            if w[0].is_nan() || w[1].is_nan() || w[1] <= w[0] {
                return Err(InterpError::NotIncreasing { index: i + 1 });
            }
        }
        Ok(Self { xs, ys })
    }

    /// Number of knots.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// True when the interpolant has no knots (never, after construction).
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Evaluate at a single point.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if n == 1 {
            return self.ys[0];
        }
        let idx = self.xs.partition_point(|&k| k < x).clamp(1, n - 1);
        let (x_lo, x_hi) = (self.xs[idx - 1], self.xs[idx]);
        let (y_lo, y_hi) = (self.ys[idx - 1], self.ys[idx]);
        let slope = (y_hi - y_lo) / (x_hi - x_lo);
        slope * (x - x_lo) + y_lo
    }

    /// Evaluate at many points.
    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

/// `n` evenly spaced values from `start` to `stop`, both inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = stop;
            out
        }
    }
}

/// The integer positions `0, 1, …, n - 1` as floats.
pub fn arange(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64).collect()
}
