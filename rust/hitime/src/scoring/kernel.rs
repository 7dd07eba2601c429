use std::f64::consts::PI;

/// Normal probability density at `x` for a Gaussian centered on `centre`.
#[inline]
pub fn gaussian(x: f64, centre: f64, sigma: f64) -> f64 {
    let z = (x - centre) / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * PI).sqrt())
}

/// Expected elution profile weight of each scan in a retention time window.
///
/// Entry `i` is the weight of the scan at offset `i - half_window` from the
/// center scan. Scans are assumed to be evenly spaced.
#[derive(Debug, Clone, PartialEq)]
pub struct RtKernel {
    half_window: usize,
    weights: Vec<f64>,
}

impl RtKernel {
    pub fn new(half_window: usize, rt_sigma: f64) -> Self {
        let weights = (0..=(2 * half_window))
            .map(|i| gaussian(i as f64, half_window as f64, rt_sigma))
            .collect();
        Self {
            half_window,
            weights,
        }
    }

    pub fn half_window(&self) -> usize {
        self.half_window
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Weight of scan `row` in the window centered on `center`.
    ///
    /// Returns `None` when `row` is outside the window.
    pub fn weight(&self, center: usize, row: usize) -> Option<f64> {
        let offset = (row + self.half_window).checked_sub(center)?;
        self.weights.get(offset).copied()
    }

    /// Scans of the window centered on `center`, truncated to `[0, num_spectra)`.
    pub fn rows(&self, center: usize, num_spectra: usize) -> std::ops::Range<usize> {
        let start = center.saturating_sub(self.half_window);
        let end = (center + self.half_window + 1).min(num_spectra);
        start..end.max(start)
    }
}
