//! Where spectra come from and where scored spectra go.
//!
//! A [`SpectrumSource`] is only ever called from inside the input cache's
//! critical section, so implementations do not need to be `Sync` and may keep
//! mutable parsing state. A [`SpectrumSink`] receives spectra strictly in
//! index order, exactly once each.

pub mod memory;
pub mod mzml;

use crate::errors::Result;
use crate::models::Spectrum;

pub use memory::{
    CollectingSink,
    InMemorySource,
};
pub use mzml::{
    MzMLSource,
    MzMLWriter,
};

pub trait SpectrumSource: Send {
    /// Number of spectra, read once before scoring starts.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads the spectrum at `index`, which must be in `[0, len)`.
    fn load(&mut self, index: usize) -> Result<Spectrum>;
}

pub trait SpectrumSink: Send {
    /// Accepts the next spectrum; called with indices `0, 1, .., N - 1` in order.
    fn consume(&mut self, spectrum: Spectrum) -> Result<()>;

    /// Finalizes the output once every spectrum has been consumed.
    fn finish(self) -> Result<()>
    where
        Self: Sized;
}
