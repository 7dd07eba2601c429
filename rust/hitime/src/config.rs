//! Scoring configuration.
//!
//! [`ScoringConfig`] is the user-facing set of parameters (serializable, every
//! field defaulted). [`ScoringParams`] is derived from it once before the
//! pipeline starts and is read-only afterwards.

use crate::scoring::kernel::RtKernel;
use serde::{
    Deserialize,
    Serialize,
};

/// Ratio between a Gaussian's full width at half maximum and its sigma.
pub const STD_DEV_IN_FWHM: f64 = 2.355;

pub const DEFAULT_CACHE_CAPACITY: usize = 30;

const DEFAULT_INTENSITY_RATIO: f64 = 1.0;
const DEFAULT_RT_FWHM_SCANS: f64 = 17.0;
const DEFAULT_RT_SIGMA_WIDTH: f64 = 1.5;
const DEFAULT_MZ_TOLERANCE_PPM: f64 = 4.0;
const DEFAULT_MZ_FWHM_PPM: f64 = 150.0;
const DEFAULT_MZ_SIGMA_WIDTH: f64 = 1.5;
const DEFAULT_MZ_DELTA: f64 = 6.0201;

/// Parameters of a scoring run.
///
/// Values are taken as given: zero or negative widths are a caller error and
/// show up as NaN scores rather than as a validation failure.
///
/// Example:
/// ```
/// use hitime::ScoringConfig;
///
/// let config = ScoringConfig::default();
/// let params = config.derive();
/// // ceil(1.5 * 17 / 2.355)
/// assert_eq!(params.half_window, 11);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Expected isotope / natural intensity ratio of a doublet.
    pub intensity_ratio: f64,
    /// Retention time full width at half maximum, in scans.
    pub rt_fwhm_scans: f64,
    /// Half width of the retention time window, in standard deviations.
    pub rt_sigma_width: f64,
    /// m/z tolerance in parts per million.
    pub mz_tolerance_ppm: f64,
    /// m/z full width at half maximum, in parts per million.
    pub mz_fwhm_ppm: f64,
    /// Half width of the m/z regions, in standard deviations.
    pub mz_sigma_width: f64,
    /// m/z difference between the natural and the isotope peak.
    pub mz_delta: f64,
    /// Minimum number of samples each region needs for a point to be scored.
    pub min_sample: f64,
    pub num_threads: usize,
    pub cache_capacity: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            intensity_ratio: DEFAULT_INTENSITY_RATIO,
            rt_fwhm_scans: DEFAULT_RT_FWHM_SCANS,
            rt_sigma_width: DEFAULT_RT_SIGMA_WIDTH,
            mz_tolerance_ppm: DEFAULT_MZ_TOLERANCE_PPM,
            mz_fwhm_ppm: DEFAULT_MZ_FWHM_PPM,
            mz_sigma_width: DEFAULT_MZ_SIGMA_WIDTH,
            mz_delta: DEFAULT_MZ_DELTA,
            min_sample: DEFAULT_RT_FWHM_SCANS * DEFAULT_RT_SIGMA_WIDTH / STD_DEV_IN_FWHM,
            num_threads: default_num_threads(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

fn default_num_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl ScoringConfig {
    pub fn derive(&self) -> ScoringParams {
        let rt_sigma = self.rt_fwhm_scans / STD_DEV_IN_FWHM;
        let half_window = (self.rt_sigma_width * self.rt_fwhm_scans / STD_DEV_IN_FWHM).ceil();
        // A NaN or negative width collapses the window to the center scan.
        let half_window = if half_window.is_finite() && half_window > 0.0 {
            half_window as usize
        } else {
            0
        };
        let mz_ppm_sigma = self.mz_fwhm_ppm / (STD_DEV_IN_FWHM * 1e6);

        ScoringParams {
            intensity_ratio: self.intensity_ratio,
            mz_delta: self.mz_delta,
            min_sample: self.min_sample,
            half_window,
            rt_sigma,
            mz_ppm_sigma,
            mz_tolerance: self.mz_sigma_width * mz_ppm_sigma,
            rt_kernel: RtKernel::new(half_window, rt_sigma),
        }
    }
}

/// Values derived from a [`ScoringConfig`], shared read-only by all workers.
#[derive(Debug, Clone)]
pub struct ScoringParams {
    pub intensity_ratio: f64,
    pub mz_delta: f64,
    pub min_sample: f64,
    /// Number of scans on each side of the center scan.
    pub half_window: usize,
    pub rt_sigma: f64,
    /// m/z sigma relative to the m/z value (fraction, not ppm).
    pub mz_ppm_sigma: f64,
    /// Relative half width of the m/z regions, `mz_sigma_width * mz_ppm_sigma`.
    pub mz_tolerance: f64,
    pub rt_kernel: RtKernel,
}

impl ScoringParams {
    /// Inclusive `[lower, upper]` m/z bounds of the region centered on `mz`.
    pub fn region_bounds(&self, mz: f64) -> (f64, f64) {
        (mz * (1.0 - self.mz_tolerance), mz * (1.0 + self.mz_tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_values() {
        let config = ScoringConfig {
            rt_fwhm_scans: 5.0,
            rt_sigma_width: 2.0,
            mz_fwhm_ppm: 150.0,
            mz_sigma_width: 1.5,
            ..Default::default()
        };
        let params = config.derive();
        // ceil(2 * 5 / 2.355) = ceil(4.246..)
        assert_eq!(params.half_window, 5);
        assert!((params.rt_sigma - 5.0 / 2.355).abs() < 1e-12);
        assert!((params.mz_ppm_sigma - 150.0 / 2.355e6).abs() < 1e-18);
        assert_eq!(params.rt_kernel.len(), 11);

        let (lo, hi) = params.region_bounds(500.0);
        let k = 1.5 * 150.0 / 2.355e6;
        assert!((lo - 500.0 * (1.0 - k)).abs() < 1e-9);
        assert!((hi - 500.0 * (1.0 + k)).abs() < 1e-9);
    }

    #[test]
    fn test_default_min_sample_matches_window() {
        let config = ScoringConfig::default();
        assert!((config.min_sample - 17.0 * 1.5 / 2.355).abs() < 1e-12);
        assert_eq!(config.cache_capacity, 30);
        assert!(config.num_threads >= 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ScoringConfig =
            serde_json::from_str(r#"{"mz_delta": 4.0, "num_threads": 2}"#).unwrap();
        assert_eq!(config.mz_delta, 4.0);
        assert_eq!(config.num_threads, 2);
        assert_eq!(config.intensity_ratio, 1.0);
        assert_eq!(config.rt_fwhm_scans, 17.0);
    }
}
