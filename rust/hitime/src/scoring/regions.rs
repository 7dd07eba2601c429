use super::kernel::gaussian;
use crate::models::Spectrum;

/// Samples gathered around one expected peak position across a retention
/// time window: observed intensities and the expected shape at the same
/// points.
#[derive(Debug, Default, Clone)]
pub struct RegionSamples {
    pub intensity: Vec<f64>,
    pub shape: Vec<f64>,
}

/// Where a region sits in m/z, and how the expected shape is built there.
#[derive(Debug, Clone, Copy)]
pub struct RegionSpec {
    pub lower: f64,
    pub upper: f64,
    pub centre: f64,
    pub sigma: f64,
}

impl RegionSamples {
    pub fn clear(&mut self) {
        self.intensity.clear();
        self.shape.clear();
    }

    pub fn len(&self) -> usize {
        self.intensity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensity.is_empty()
    }

    /// Appends every peak of `spectrum` inside the region.
    ///
    /// The shape sample is the m/z Gaussian at the peak scaled by `weight`
    /// (retention time weight, times the intensity ratio on the isotope side).
    pub fn extend_from(&mut self, spectrum: &Spectrum, region: &RegionSpec, weight: f64) {
        let range = spectrum.mz_range_indices(region.lower, region.upper);
        let mz = &spectrum.mz()[range.clone()];
        let intensity = &spectrum.intensity()[range];
        for (&mz, &intensity) in mz.iter().zip(intensity.iter()) {
            self.intensity.push(intensity);
            self.shape.push(gaussian(mz, region.centre, region.sigma) * weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(centre: f64) -> RegionSpec {
        RegionSpec {
            lower: centre - 0.5,
            upper: centre + 0.5,
            centre,
            sigma: 0.25,
        }
    }

    #[test]
    fn test_only_peaks_in_bounds_are_collected() {
        let spec = Spectrum::try_new(
            0,
            vec![99.0, 99.6, 100.0, 100.5, 101.0],
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();
        let mut samples = RegionSamples::default();
        samples.extend_from(&spec, &region(100.0), 2.0);
        assert_eq!(samples.intensity, vec![2.0, 3.0, 4.0]);
        assert_eq!(samples.len(), 3);

        let at_centre = gaussian(100.0, 100.0, 0.25) * 2.0;
        assert!((samples.shape[1] - at_centre).abs() < 1e-12);
        assert!(samples.shape[0] < samples.shape[1]);
        assert!(samples.shape[2] < samples.shape[1]);
    }

    #[test]
    fn test_samples_accumulate_until_cleared() {
        let spec = Spectrum::try_new(0, vec![100.0], vec![7.0]).unwrap();
        let mut samples = RegionSamples::default();
        samples.extend_from(&spec, &region(100.0), 1.0);
        samples.extend_from(&spec, &region(100.0), 0.5);
        assert_eq!(samples.len(), 2);
        assert!((samples.shape[0] - 2.0 * samples.shape[1]).abs() < 1e-12);
        samples.clear();
        assert!(samples.is_empty());
        assert!(samples.shape.is_empty());
    }
}
