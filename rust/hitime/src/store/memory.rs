use super::{
    SpectrumSink,
    SpectrumSource,
};
use crate::errors::{
    DataProcessingError,
    Result,
};
use crate::models::Spectrum;

/// Vector backed source, counting how many times each spectrum was loaded.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    spectra: Vec<Spectrum>,
    loads: Vec<usize>,
}

impl InMemorySource {
    pub fn new(spectra: Vec<Spectrum>) -> Self {
        let loads = vec![0; spectra.len()];
        Self { spectra, loads }
    }

    /// Number of times `index` was loaded.
    pub fn load_count(&self, index: usize) -> usize {
        self.loads.get(index).copied().unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.loads.iter().sum()
    }
}

impl SpectrumSource for InMemorySource {
    fn len(&self) -> usize {
        self.spectra.len()
    }

    fn load(&mut self, index: usize) -> Result<Spectrum> {
        let len = self.spectra.len();
        let spectrum = self
            .spectra
            .get(index)
            .cloned()
            .ok_or(DataProcessingError::IndexOutOfBounds { index, len })?;
        self.loads[index] += 1;
        Ok(spectrum)
    }
}

impl<S: SpectrumSource + ?Sized> SpectrumSource for &mut S {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn load(&mut self, index: usize) -> Result<Spectrum> {
        (**self).load(index)
    }
}

/// Sink that keeps every consumed spectrum, in delivery order.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub spectra: Vec<Spectrum>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered_indices(&self) -> Vec<usize> {
        self.spectra.iter().map(|s| s.index).collect()
    }
}

impl SpectrumSink for CollectingSink {
    fn consume(&mut self, spectrum: Spectrum) -> Result<()> {
        self.spectra.push(spectrum);
        Ok(())
    }

    fn finish(self) -> Result<()> {
        Ok(())
    }
}

/// Borrowed sinks are never finalized through the borrow, the owner does that.
impl<S: SpectrumSink + ?Sized> SpectrumSink for &mut S {
    fn consume(&mut self, spectrum: Spectrum) -> Result<()> {
        (**self).consume(spectrum)
    }

    fn finish(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_counts_loads() {
        let spectra = (0..3)
            .map(|i| Spectrum::try_new(i, vec![100.0], vec![1.0]).unwrap())
            .collect();
        let mut source = InMemorySource::new(spectra);
        assert_eq!(source.len(), 3);
        source.load(1).unwrap();
        source.load(1).unwrap();
        source.load(2).unwrap();
        assert_eq!(source.load_count(0), 0);
        assert_eq!(source.load_count(1), 2);
        assert_eq!(source.total_loads(), 3);
        assert!(source.load(3).is_err());
    }
}
