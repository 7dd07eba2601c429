#![doc = include_str!("../README.md")]
pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod store;

pub use config::{
    ScoringConfig,
    ScoringParams,
};
pub use errors::{
    DataProcessingError,
    DataReadingError,
    HitimeError,
};
pub use models::Spectrum;
pub use pipeline::{
    run,
    score_doublets,
    PipelineOptions,
    PipelineStats,
};
pub use scoring::{
    DoubletScorer,
    SpectrumScorer,
    WindowAccess,
};
pub use store::{
    SpectrumSink,
    SpectrumSource,
};
