pub mod correlation;
pub mod engine;
pub mod kernel;
pub mod regions;
pub mod steiger;

pub use engine::{
    DoubletScorer,
    ModelComparison,
    ScoringBuffers,
    SpectrumScorer,
    WindowAccess,
};
pub use kernel::RtKernel;
