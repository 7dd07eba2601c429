use super::stats::CacheStats;
use crate::errors::Result;
use crate::models::Spectrum;
use crate::scoring::WindowAccess;
use crate::store::SpectrumSource;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{
    Arc,
    Mutex,
    PoisonError,
    Weak,
};

/// Bounded LRU cache in front of a [`SpectrumSource`], shared by all workers.
///
/// Lookup, load on miss and insert/evict happen under one lock, so the source
/// is never called concurrently and an index is never loaded twice at the
/// same time. Evicted spectra are remembered weakly: if some window still
/// holds one when it is requested again, that same instance comes back
/// instead of a second copy.
pub struct InputCache<S> {
    num_spectra: usize,
    inner: Mutex<CacheState<S>>,
}

struct CacheState<S> {
    source: S,
    lru: LruCache<usize, Arc<Spectrum>>,
    retired: HashMap<usize, Weak<Spectrum>>,
    stats: CacheStats,
}

impl<S: SpectrumSource> InputCache<S> {
    /// A capacity of zero is treated as one.
    pub fn new(source: S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            num_spectra: source.len(),
            inner: Mutex::new(CacheState {
                source,
                lru: LruCache::new(capacity),
                retired: HashMap::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    pub fn get_or_load(&self, index: usize) -> Result<Arc<Spectrum>> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.get_or_load(index)
    }

    pub fn stats(&self) -> CacheStats {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
    }

    /// Cached indices, most recently used first.
    pub fn cached_indices(&self) -> Vec<usize> {
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.lru.iter().map(|(k, _)| *k).collect()
    }

    pub fn into_source(self) -> S {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .source
    }
}

impl<S: SpectrumSource> CacheState<S> {
    fn get_or_load(&mut self, index: usize) -> Result<Arc<Spectrum>> {
        if let Some(hit) = self.lru.get(&index) {
            self.stats.hits += 1;
            return Ok(Arc::clone(hit));
        }

        let spectrum = match self.retired.remove(&index).and_then(|w| w.upgrade()) {
            Some(alive) => {
                self.stats.revivals += 1;
                alive
            }
            None => {
                self.stats.misses += 1;
                Arc::new(self.source.load(index)?)
            }
        };

        if let Some((evicted_index, evicted)) = self.lru.push(index, Arc::clone(&spectrum)) {
            self.retire(evicted_index, &evicted);
        }
        Ok(spectrum)
    }

    fn retire(&mut self, index: usize, spectrum: &Arc<Spectrum>) {
        if self.retired.len() >= self.lru.cap().get() {
            self.retired.retain(|_, w| w.strong_count() > 0);
        }
        self.retired.insert(index, Arc::downgrade(spectrum));
    }
}

impl<S: SpectrumSource> WindowAccess for InputCache<S> {
    fn num_spectra(&self) -> usize {
        self.num_spectra
    }

    fn fetch(&self, index: usize) -> Result<Arc<Spectrum>> {
        self.get_or_load(index)
    }
}
