use super::cache::InputCache;
use super::distributor::WorkDistributor;
use super::sequencer::OutputSequencer;
use super::stats::PipelineStats;
use crate::config::ScoringConfig;
use crate::errors::{
    HitimeError,
    Result,
};
use crate::scoring::{
    DoubletScorer,
    SpectrumScorer,
};
use crate::store::{
    SpectrumSink,
    SpectrumSource,
};
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::sync::{
    Mutex,
    PoisonError,
};
use std::time::Instant;
use tracing::{
    debug,
    error,
    info,
    warn,
};

/// Execution settings of a run, as opposed to scoring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub num_threads: usize,
    pub cache_capacity: usize,
}

impl From<&ScoringConfig> for PipelineOptions {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            num_threads: config.num_threads,
            cache_capacity: config.cache_capacity,
        }
    }
}

struct Shared<'a, S, K, Sc> {
    distributor: WorkDistributor,
    cache: InputCache<S>,
    sequencer: OutputSequencer<K>,
    scorer: &'a Sc,
    abort: AtomicBool,
}

impl<S, K, Sc> Shared<'_, S, K, Sc>
where
    S: SpectrumSource,
    K: SpectrumSink,
    Sc: SpectrumScorer,
{
    fn work(&self, worker: usize, stats: &mut PipelineStats) -> Result<()> {
        while !self.abort.load(Ordering::Acquire) {
            let Some(index) = self.distributor.next() else {
                break;
            };
            let start = Instant::now();
            // Held while scoring so the scorer sees this same instance even
            // if its window evicts the center from the cache.
            let center = self.cache.get_or_load(index)?;
            if center.is_empty() {
                warn!("Spectrum {} ({}) has no peaks", index, center.native_id);
            }
            let scores = self.scorer.score(index, &self.cache)?;
            let scored = center.with_intensities(scores)?;
            stats.record_spectrum(scored.intensity(), start.elapsed());
            debug!("Scored spectrum {} in {:?}", index, start.elapsed());
            self.sequencer.submit(index, scored)?;
        }
        debug!(
            "Worker {} finished after scoring {} spectra",
            worker, stats.spectra_scored
        );
        Ok(())
    }
}

/// Scores every spectrum of `source` with `scorer` on a pool of
/// `options.num_threads` workers and writes the results to `sink` in index
/// order.
///
/// The first error any worker hits stops the run: remaining workers finish
/// their current spectrum and exit, nothing more reaches the sink, and the
/// sink is not finalized.
pub fn run<S, K, Sc>(
    source: S,
    sink: K,
    scorer: &Sc,
    options: PipelineOptions,
) -> Result<PipelineStats>
where
    S: SpectrumSource,
    K: SpectrumSink,
    Sc: SpectrumScorer,
{
    let start = Instant::now();
    let num_spectra = source.len();
    let num_threads = options.num_threads.max(1);
    info!(
        "Scoring {} spectra on {} threads (cache capacity {})",
        num_spectra, num_threads, options.cache_capacity
    );

    let shared = Shared {
        distributor: WorkDistributor::new(num_spectra),
        cache: InputCache::new(source, options.cache_capacity),
        sequencer: OutputSequencer::new(sink, num_spectra),
        scorer,
        abort: AtomicBool::new(false),
    };
    let first_error: Mutex<Option<HitimeError>> = Mutex::new(None);
    let totals = Mutex::new(PipelineStats::default());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("hitime-worker-{}", i))
        .build()?;

    pool.scope(|s| {
        for worker in 0..num_threads {
            let shared = &shared;
            let first_error = &first_error;
            let totals = &totals;
            s.spawn(move |_| {
                let mut stats = PipelineStats::default();
                if let Err(e) = shared.work(worker, &mut stats) {
                    if !shared.abort.swap(true, Ordering::AcqRel) {
                        error!("Worker {} failed, aborting: {}", worker, e);
                    }
                    shared.sequencer.abort();
                    first_error
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .get_or_insert(e);
                }
                *totals.lock().unwrap_or_else(PoisonError::into_inner) += stats;
            });
        }
    });

    let Shared {
        cache, sequencer, ..
    } = shared;
    let mut stats = totals.into_inner().unwrap_or_else(PoisonError::into_inner);
    stats.cache = cache.stats();
    stats.elapsed = start.elapsed();

    if let Some(e) = first_error
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
    {
        return Err(e);
    }

    sequencer.into_sink()?.finish()?;
    info!(
        "Scored {} spectra ({} points, {} positive) in {:?}",
        stats.spectra_scored, stats.points_scored, stats.positive_points, stats.elapsed
    );
    Ok(stats)
}

/// Runs the doublet scorer over `source` with the parameters of `config`.
pub fn score_doublets<S, K>(config: &ScoringConfig, source: S, sink: K) -> Result<PipelineStats>
where
    S: SpectrumSource,
    K: SpectrumSink,
{
    let params = config.derive();
    info!(
        "Derived parameters: half window {} scans, rt sigma {:.3}, m/z sigma {:.3e}, min sample {:.2}",
        params.half_window, params.rt_sigma, params.mz_ppm_sigma, params.min_sample
    );
    let scorer = DoubletScorer::new(params);
    run(source, sink, &scorer, PipelineOptions::from(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Spectrum;
    use crate::scoring::WindowAccess;
    use crate::store::{
        CollectingSink,
        InMemorySource,
    };

    /// Scores each point with its own index, touching its neighbours.
    struct IndexScorer;

    impl SpectrumScorer for IndexScorer {
        fn score<W: WindowAccess + ?Sized>(&self, center: usize, window: &W) -> Result<Vec<f64>> {
            let lo = center.saturating_sub(1);
            let hi = (center + 1).min(window.num_spectra() - 1);
            for row in lo..=hi {
                window.fetch(row)?;
            }
            let spectrum = window.fetch(center)?;
            Ok(vec![center as f64; spectrum.len()])
        }
    }

    fn source(n: usize) -> InMemorySource {
        InMemorySource::new(
            (0..n)
                .map(|i| Spectrum::try_new(i, vec![100.0, 200.0], vec![1.0, 1.0]).unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_run_scores_everything_in_order() {
        let mut sink = CollectingSink::new();
        let options = PipelineOptions {
            num_threads: 4,
            cache_capacity: 3,
        };
        let stats = run(source(50), &mut sink, &IndexScorer, options).unwrap();
        assert_eq!(sink.delivered_indices(), (0..50).collect::<Vec<_>>());
        for s in &sink.spectra {
            assert_eq!(s.intensity(), &[s.index as f64, s.index as f64]);
            assert_eq!(s.mz(), &[100.0, 200.0]);
        }
        assert_eq!(stats.spectra_scored, 50);
        assert_eq!(stats.points_scored, 100);
        assert_eq!(stats.positive_points, 98);
        assert!(stats.cache.misses >= 50);
    }

    #[test]
    fn test_empty_source() {
        let mut sink = CollectingSink::new();
        let options = PipelineOptions {
            num_threads: 2,
            cache_capacity: 1,
        };
        let stats = run(source(0), &mut sink, &IndexScorer, options).unwrap();
        assert!(sink.spectra.is_empty());
        assert_eq!(stats.spectra_scored, 0);
    }

    #[test]
    fn test_center_is_not_reloaded_after_scoring() {
        /// Looks one spectrum ahead, which evicts the center from a cache of one.
        struct LookaheadScorer;
        impl SpectrumScorer for LookaheadScorer {
            fn score<W: WindowAccess + ?Sized>(
                &self,
                center: usize,
                window: &W,
            ) -> Result<Vec<f64>> {
                let spectrum = window.fetch(center)?;
                window.fetch((center + 1).min(window.num_spectra() - 1))?;
                Ok(vec![1.0; spectrum.len()])
            }
        }

        let n = 20;
        let mut input = source(n);
        let mut sink = CollectingSink::new();
        let options = PipelineOptions {
            num_threads: 1,
            cache_capacity: 1,
        };
        run(&mut input, &mut sink, &LookaheadScorer, options).unwrap();
        assert_eq!(sink.delivered_indices(), (0..n).collect::<Vec<_>>());
        assert_eq!(input.total_loads(), n);
        for i in 0..n {
            assert_eq!(input.load_count(i), 1);
        }
    }

    #[test]
    fn test_length_mismatch_aborts() {
        struct ShortScorer;
        impl SpectrumScorer for ShortScorer {
            fn score<W: WindowAccess + ?Sized>(&self, _: usize, _: &W) -> Result<Vec<f64>> {
                Ok(vec![0.0])
            }
        }

        let mut sink = CollectingSink::new();
        let options = PipelineOptions {
            num_threads: 2,
            cache_capacity: 4,
        };
        assert!(run(source(10), &mut sink, &ShortScorer, options).is_err());
        assert!(sink.spectra.is_empty());
    }
}
