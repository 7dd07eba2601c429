use crate::errors::DataProcessingError;
use std::sync::Arc;

/// A single centroided spectrum, stored as parallel m/z and intensity arrays.
///
/// Spectra are immutable once built. The arrays are reference counted so a
/// scored copy (see [`Spectrum::with_intensities`]) shares the m/z array of
/// the spectrum it was derived from instead of copying it.
///
/// Whether the peaks are sorted by m/z is checked once at construction and
/// remembered, since every window lookup relies on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub index: usize,
    pub native_id: String,
    pub ms_level: u8,
    pub retention_time_seconds: Option<f64>,
    mz: Arc<[f64]>,
    intensity: Arc<[f64]>,
    sorted: bool,
}

impl Spectrum {
    pub fn try_new(
        index: usize,
        mz: Vec<f64>,
        intensity: Vec<f64>,
    ) -> Result<Self, DataProcessingError> {
        if mz.len() != intensity.len() {
            return Err(DataProcessingError::ExpectedSlicesSameLength {
                expected: mz.len(),
                other: intensity.len(),
                context: format!("Spectrum::try_new (index {})", index),
            });
        }
        let sorted = mz.windows(2).all(|w| w[0] <= w[1]);
        Ok(Self {
            index,
            native_id: format!("index={}", index),
            ms_level: 1,
            retention_time_seconds: None,
            mz: mz.into(),
            intensity: intensity.into(),
            sorted,
        })
    }

    pub fn with_native_id(mut self, native_id: impl Into<String>) -> Self {
        self.native_id = native_id.into();
        self
    }

    pub fn with_ms_level(mut self, ms_level: u8) -> Self {
        self.ms_level = ms_level;
        self
    }

    pub fn with_retention_time(mut self, seconds: f64) -> Self {
        self.retention_time_seconds = Some(seconds);
        self
    }

    /// Builds a copy of this spectrum whose intensities are replaced.
    ///
    /// The m/z array and metadata are shared with `self`, so the values
    /// reported back are exactly the ones that were scored.
    pub fn with_intensities(&self, intensity: Vec<f64>) -> Result<Self, DataProcessingError> {
        if intensity.len() != self.mz.len() {
            return Err(DataProcessingError::ExpectedSlicesSameLength {
                expected: self.mz.len(),
                other: intensity.len(),
                context: format!("Spectrum::with_intensities (index {})", self.index),
            });
        }
        Ok(Self {
            index: self.index,
            native_id: self.native_id.clone(),
            ms_level: self.ms_level,
            retention_time_seconds: self.retention_time_seconds,
            mz: Arc::clone(&self.mz),
            intensity: intensity.into(),
            sorted: self.sorted,
        })
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn mz(&self) -> &[f64] {
        &self.mz
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn shares_mz_with(&self, other: &Spectrum) -> bool {
        Arc::ptr_eq(&self.mz, &other.mz)
    }

    /// Indices of the peaks with `lower <= mz <= upper`.
    ///
    /// Only meaningful on sorted spectra; callers check [`Spectrum::is_sorted`].
    pub fn mz_range_indices(&self, lower: f64, upper: f64) -> std::ops::Range<usize> {
        let start = self.mz.partition_point(|&x| x < lower);
        let end = self.mz.partition_point(|&x| x <= upper);
        start..end.max(start)
    }

    pub fn iter_peaks(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.mz.iter().copied().zip(self.intensity.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch_is_rejected() {
        let res = Spectrum::try_new(0, vec![1.0, 2.0], vec![1.0]);
        assert!(matches!(
            res,
            Err(DataProcessingError::ExpectedSlicesSameLength { .. })
        ));
    }

    #[test]
    fn test_sortedness_is_detected() {
        let sorted = Spectrum::try_new(0, vec![1.0, 2.0, 2.0, 3.0], vec![0.0; 4]).unwrap();
        assert!(sorted.is_sorted());
        let unsorted = Spectrum::try_new(1, vec![1.0, 3.0, 2.0], vec![0.0; 3]).unwrap();
        assert!(!unsorted.is_sorted());
    }

    #[test]
    fn test_mz_range_is_inclusive() {
        let spec = Spectrum::try_new(
            0,
            vec![100.0, 200.0, 300.0, 400.0, 500.0],
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();
        assert_eq!(spec.mz_range_indices(200.0, 400.0), 1..4);
        assert_eq!(spec.mz_range_indices(201.0, 399.0), 2..3);
        assert_eq!(spec.mz_range_indices(301.0, 399.0), 3..3);
        assert_eq!(spec.mz_range_indices(600.0, 700.0), 5..5);
        // Inverted bounds give an empty range, never a panic.
        assert!(spec.mz_range_indices(400.0, 200.0).is_empty());
    }

    #[test]
    fn test_scored_copy_shares_mz() {
        let spec = Spectrum::try_new(3, vec![100.0, 200.0], vec![10.0, 20.0])
            .unwrap()
            .with_native_id("scan=4")
            .with_retention_time(12.5);
        let scored = spec.with_intensities(vec![0.0, 7.5]).unwrap();
        assert!(scored.shares_mz_with(&spec));
        assert_eq!(scored.mz(), spec.mz());
        assert_eq!(scored.intensity(), &[0.0, 7.5]);
        assert_eq!(scored.native_id, "scan=4");
        assert_eq!(scored.retention_time_seconds, Some(12.5));
        assert!(spec.with_intensities(vec![1.0]).is_err());
    }
}
