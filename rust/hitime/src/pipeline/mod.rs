//! The concurrent scoring pipeline.
//!
//! Workers pull indices from a [`WorkDistributor`], read their window through
//! the shared [`InputCache`], score the center spectrum and hand the result to
//! the [`OutputSequencer`], which writes to the sink in index order. The cache
//! and the sequencer each have their own lock; the distributor is a single
//! atomic counter.

pub mod cache;
pub mod distributor;
pub mod orchestrator;
pub mod sequencer;
pub mod stats;

pub use cache::InputCache;
pub use distributor::WorkDistributor;
pub use orchestrator::{
    run,
    score_doublets,
    PipelineOptions,
};
pub use sequencer::{
    OutputSequencer,
    ReorderBuffer,
};
pub use stats::{
    CacheStats,
    PipelineStats,
};
