pub mod spectrum;

pub use spectrum::Spectrum;
