//! Per-point doublet scoring.
//!
//! For every peak of a center spectrum, samples are gathered in two m/z
//! regions (the peak itself and the position `mz_delta` above it) across the
//! retention time window. The observed intensities are then compared against
//! three competing expectations:
//!
//! - **AB**: a true doublet, both regions follow the expected shape.
//! - **A0**: natural peak only, the isotope region is flat zero.
//! - **0B**: isotope only, the natural region is flat zero.
//!
//! Steiger's test checks AB against each single-region alternative and the
//! point keeps the weaker of the two results, floored at zero.

use super::correlation::{
    support,
    TwoRegion,
};
use super::regions::{
    RegionSamples,
    RegionSpec,
};
use super::steiger::steiger_z;
use crate::config::ScoringParams;
use crate::errors::{
    DataProcessingError,
    Result,
};
use crate::models::Spectrum;
use std::sync::Arc;

/// Random access to the spectra around a center scan.
pub trait WindowAccess {
    fn num_spectra(&self) -> usize;
    fn fetch(&self, index: usize) -> Result<Arc<Spectrum>>;
}

/// Something that turns the spectrum at `center` into one score per peak.
///
/// The returned vector must be aligned with the peaks of the center spectrum.
pub trait SpectrumScorer: Sync {
    fn score<W: WindowAccess + ?Sized>(&self, center: usize, window: &W) -> Result<Vec<f64>>;
}

/// Outcome of comparing the doublet model against both alternatives at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelComparison {
    pub r_doublet: f64,
    pub r_natural_only: f64,
    pub r_isotope_only: f64,
    /// Correlation between the AB and A0 expectations.
    pub r_models_natural: f64,
    /// Correlation between the AB and 0B expectations.
    pub r_models_isotope: f64,
    pub z_vs_natural_only: f64,
    pub z_vs_isotope_only: f64,
    pub num_samples: usize,
}

impl ModelComparison {
    /// `max(0, min(z_vs_natural_only, z_vs_isotope_only))`, with NaN mapped to 0.
    pub fn score(&self) -> f64 {
        if self.z_vs_natural_only.is_nan() || self.z_vs_isotope_only.is_nan() {
            return 0.0;
        }
        self.z_vs_natural_only.min(self.z_vs_isotope_only).max(0.0)
    }
}

/// Sample buffers reused across all the points of a spectrum.
#[derive(Debug, Default)]
pub struct ScoringBuffers {
    pub natural: RegionSamples,
    pub isotope: RegionSamples,
    zeros: Vec<f64>,
}

impl ScoringBuffers {
    pub fn clear(&mut self) {
        self.natural.clear();
        self.isotope.clear();
    }

    /// True when both regions hold at least `min_sample` samples.
    pub fn has_enough_samples(&self, min_sample: f64) -> bool {
        (self.natural.len() as f64) >= min_sample && (self.isotope.len() as f64) >= min_sample
    }

    /// Compares the doublet model against both single-region models on the
    /// samples currently in the buffers.
    pub fn compare_models(&mut self) -> ModelComparison {
        let longest = self.natural.len().max(self.isotope.len());
        if self.zeros.len() < longest {
            self.zeros.resize(longest, 0.0);
        }
        let flat_natural = &self.zeros[..self.natural.len()];
        let flat_isotope = &self.zeros[..self.isotope.len()];

        let data = TwoRegion::new(&self.natural.intensity, &self.isotope.intensity);
        let doublet = TwoRegion::new(&self.natural.shape, &self.isotope.shape);
        let natural_only = TwoRegion::new(&self.natural.shape, flat_isotope);
        let isotope_only = TwoRegion::new(flat_natural, &self.isotope.shape);

        let r_doublet = support(data, doublet);
        let r_natural_only = support(data, natural_only);
        let r_isotope_only = support(data, isotope_only);
        let r_models_natural = support(doublet, natural_only);
        let r_models_isotope = support(doublet, isotope_only);

        let num_samples = data.num_samples();
        ModelComparison {
            r_doublet,
            r_natural_only,
            r_isotope_only,
            r_models_natural,
            r_models_isotope,
            z_vs_natural_only: steiger_z(
                r_doublet,
                r_natural_only,
                r_models_natural,
                num_samples,
            ),
            z_vs_isotope_only: steiger_z(
                r_doublet,
                r_isotope_only,
                r_models_isotope,
                num_samples,
            ),
            num_samples,
        }
    }
}

/// The production scorer: isotope doublet evidence per point.
#[derive(Debug, Clone)]
pub struct DoubletScorer {
    pub params: ScoringParams,
}

impl DoubletScorer {
    pub fn new(params: ScoringParams) -> Self {
        Self { params }
    }

    /// Fetches the (edge truncated) window around `center` together with the
    /// retention time weight of each row.
    fn fetch_window<W: WindowAccess + ?Sized>(
        &self,
        center: usize,
        window: &W,
    ) -> Result<Vec<(Arc<Spectrum>, f64)>> {
        let kernel = &self.params.rt_kernel;
        let num_spectra = window.num_spectra();
        if center >= num_spectra {
            return Err(DataProcessingError::IndexOutOfBounds {
                index: center,
                len: num_spectra,
            }
            .into());
        }

        let rows = kernel.rows(center, num_spectra);
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let spectrum = window.fetch(row)?;
            if !spectrum.is_sorted() {
                return Err(DataProcessingError::UnsortedSpectrum { index: row }.into());
            }
            let weight = kernel
                .weight(center, row)
                .ok_or(DataProcessingError::IndexOutOfBounds {
                    index: row,
                    len: num_spectra,
                })?;
            out.push((spectrum, weight));
        }
        Ok(out)
    }

    /// Score of a single point at m/z `mz` given the window rows.
    ///
    /// The buffers are cleared first, so every point is scored on its own
    /// samples only.
    pub fn score_point(
        &self,
        mz: f64,
        rows: &[(Arc<Spectrum>, f64)],
        buffers: &mut ScoringBuffers,
    ) -> f64 {
        let params = &self.params;
        buffers.clear();

        let (lower, upper) = params.region_bounds(mz);
        let natural = RegionSpec {
            lower,
            upper,
            centre: mz,
            sigma: mz * params.mz_ppm_sigma,
        };
        let isotope_mz = mz + params.mz_delta;
        let (lower, upper) = params.region_bounds(isotope_mz);
        let isotope = RegionSpec {
            lower,
            upper,
            centre: isotope_mz,
            sigma: isotope_mz * params.mz_ppm_sigma,
        };

        for (spectrum, rt_weight) in rows {
            buffers.natural.extend_from(spectrum, &natural, *rt_weight);
            buffers
                .isotope
                .extend_from(spectrum, &isotope, rt_weight * params.intensity_ratio);
        }

        if !buffers.has_enough_samples(params.min_sample) {
            return 0.0;
        }
        buffers.compare_models().score()
    }
}

impl SpectrumScorer for DoubletScorer {
    fn score<W: WindowAccess + ?Sized>(&self, center: usize, window: &W) -> Result<Vec<f64>> {
        let rows = self.fetch_window(center, window)?;
        let center_offset = center - self.params.rt_kernel.rows(center, window.num_spectra()).start;
        let center_spectrum = Arc::clone(&rows[center_offset].0);

        let mut buffers = ScoringBuffers::default();
        let scores = center_spectrum
            .mz()
            .iter()
            .map(|&mz| self.score_point(mz, &rows, &mut buffers))
            .collect();
        Ok(scores)
    }
}
