//! Counters collected while a pipeline runs.
//!
//! Every worker keeps its own [`PipelineStats`] and the orchestrator sums
//! them once all workers have joined.

use serde::Serialize;
use std::time::Duration;

/// Accesses served by the input cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    /// Loads from the spectrum source.
    pub misses: usize,
    /// Evicted spectra handed out again because a window still held them.
    pub revivals: usize,
}

impl std::ops::AddAssign for CacheStats {
    fn add_assign(&mut self, rhs: Self) {
        self.hits += rhs.hits;
        self.misses += rhs.misses;
        self.revivals += rhs.revivals;
    }
}

#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    pub spectra_scored: usize,
    pub points_scored: usize,
    /// Points whose score ended above zero.
    pub positive_points: usize,
    pub cache: CacheStats,
    /// Time spent inside the scorer, summed over workers.
    pub scoring: Duration,
    /// Wall clock time of the whole run.
    pub elapsed: Duration,
}

impl PipelineStats {
    pub fn record_spectrum(&mut self, scores: &[f64], took: Duration) {
        self.spectra_scored += 1;
        self.points_scored += scores.len();
        self.positive_points += scores.iter().filter(|&&s| s > 0.0).count();
        self.scoring += took;
    }
}

impl Serialize for PipelineStats {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("PipelineStats", 6)?;
        state.serialize_field("spectra_scored", &self.spectra_scored)?;
        state.serialize_field("points_scored", &self.points_scored)?;
        state.serialize_field("positive_points", &self.positive_points)?;
        state.serialize_field("cache", &self.cache)?;
        state.serialize_field("scoring_ms", &self.scoring.as_millis())?;
        state.serialize_field("elapsed_ms", &self.elapsed.as_millis())?;
        state.end()
    }
}

impl std::ops::AddAssign for PipelineStats {
    fn add_assign(&mut self, rhs: Self) {
        self.spectra_scored += rhs.spectra_scored;
        self.points_scored += rhs.points_scored;
        self.positive_points += rhs.positive_points;
        self.cache += rhs.cache;
        self.scoring += rhs.scoring;
        self.elapsed = self.elapsed.max(rhs.elapsed);
    }
}
