//! Two-region ("hierarchical") moments and correlation.
//!
//! Samples come in two regions (natural and isotope). Every expectation is a
//! mean of the two regional means, so each region carries the same weight no
//! matter how many samples it contributed:
//!
//! ```text
//! E(X)      = (E(Xa) + E(Xb)) / 2
//! Cov(X, Y) = (E((Xa - E(X))(Ya - E(Y))) + E((Xb - E(X))(Yb - E(Y)))) / 2
//! ```

/// Upper bound applied to correlations before they are Fisher transformed.
/// Rounding can push a perfect fit to (or past) 1, where `atanh` diverges.
pub const MAX_CORRELATION: f64 = 1.0 - 1e-12;

/// Arithmetic mean, NaN for an empty slice.
pub fn mean(vals: &[f64]) -> f64 {
    vals.iter().sum::<f64>() / vals.len() as f64
}

/// Mean of the two regional means.
pub fn hierarchical_mean(a: &[f64], b: &[f64]) -> f64 {
    0.5 * (mean(a) + mean(b))
}

/// One variable observed in two regions.
#[derive(Debug, Clone, Copy)]
pub struct TwoRegion<'a> {
    pub a: &'a [f64],
    pub b: &'a [f64],
}

impl<'a> TwoRegion<'a> {
    pub fn new(a: &'a [f64], b: &'a [f64]) -> Self {
        Self { a, b }
    }

    pub fn mean(&self) -> f64 {
        hierarchical_mean(self.a, self.b)
    }

    pub fn num_samples(&self) -> usize {
        self.a.len() + self.b.len()
    }
}

fn centered_product_mean(x: &[f64], ex: f64, y: &[f64], ey: f64) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let sum: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(&x, &y)| (x - ex) * (y - ey))
        .sum();
    sum / x.len() as f64
}

/// Covariance of two variables sampled at the same points of both regions.
pub fn hierarchical_covariance(x: TwoRegion, y: TwoRegion) -> f64 {
    let ex = x.mean();
    let ey = y.mean();
    0.5 * (centered_product_mean(x.a, ex, y.a, ey) + centered_product_mean(x.b, ex, y.b, ey))
}

/// Pearson style correlation on hierarchical moments, without clamping.
pub fn hierarchical_correlation(x: TwoRegion, y: TwoRegion) -> f64 {
    let cov = hierarchical_covariance(x, y);
    let var_x = hierarchical_covariance(x, x);
    let var_y = hierarchical_covariance(y, y);
    cov / (var_x * var_y).sqrt()
}

/// Clamps a correlation into `[0, MAX_CORRELATION]`.
///
/// Negative fits give no support to a model, and NaN (a flat region has zero
/// variance) is treated the same way instead of comparing as "not below 0".
pub fn clamp_correlation(r: f64) -> f64 {
    if r.is_nan() || r <= 0.0 {
        0.0
    } else {
        r.min(MAX_CORRELATION)
    }
}

/// Clamped hierarchical correlation, the form every score uses.
pub fn support(x: TwoRegion, y: TwoRegion) -> f64 {
    clamp_correlation(hierarchical_correlation(x, y))
}
