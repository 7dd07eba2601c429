use crate::errors::{
    DataProcessingError,
    Result,
};
use crate::models::Spectrum;
use crate::store::SpectrumSink;
use std::collections::BTreeMap;
use std::sync::{
    Mutex,
    PoisonError,
};

/// Restores index order over items that complete out of order.
///
/// Items are pushed with their index and come back out of [`pop_ready`]
/// strictly as `0, 1, 2, ..`, each once the whole prefix before it has been
/// pushed.
///
/// [`pop_ready`]: ReorderBuffer::pop_ready
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next_expected: usize,
    pending: BTreeMap<usize, T>,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self {
            next_expected: 0,
            pending: BTreeMap::new(),
        }
    }
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_expected(&self) -> usize {
        self.next_expected
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Panics if `index` was already pushed, since every index is produced
    /// exactly once.
    pub fn push(&mut self, index: usize, item: T) {
        assert!(
            index >= self.next_expected,
            "index {} was already released",
            index
        );
        let previous = self.pending.insert(index, item);
        assert!(previous.is_none(), "index {} pushed twice", index);
    }

    /// Next item in index order, if it has arrived.
    pub fn pop_ready(&mut self) -> Option<T> {
        let (&first, _) = self.pending.first_key_value()?;
        if first != self.next_expected {
            return None;
        }
        let (_, item) = self.pending.pop_first()?;
        self.next_expected += 1;
        Some(item)
    }
}

struct SequencerState<K> {
    buffer: ReorderBuffer<Spectrum>,
    sink: K,
    delivered: usize,
    aborted: bool,
}

/// Feeds scored spectra to a sink in index order, whatever order the workers
/// finish in. Has its own lock, independent of the input cache.
pub struct OutputSequencer<K> {
    expected: usize,
    inner: Mutex<SequencerState<K>>,
}

impl<K: SpectrumSink> OutputSequencer<K> {
    pub fn new(sink: K, expected: usize) -> Self {
        Self {
            expected,
            inner: Mutex::new(SequencerState {
                buffer: ReorderBuffer::new(),
                sink,
                delivered: 0,
                aborted: false,
            }),
        }
    }

    /// Queues a scored spectrum and delivers everything that is now in order.
    ///
    /// After [`abort`](Self::abort) submissions are dropped.
    pub fn submit(&self, index: usize, spectrum: Spectrum) -> Result<()> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if state.aborted {
            return Ok(());
        }
        state.buffer.push(index, spectrum);
        while let Some(ready) = state.buffer.pop_ready() {
            state.sink.consume(ready)?;
            state.delivered += 1;
        }
        Ok(())
    }

    pub fn abort(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .aborted = true;
    }

    pub fn delivered(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .delivered
    }

    /// Returns the sink once every expected spectrum reached it.
    pub fn into_sink(self) -> Result<K> {
        let state = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        if state.aborted {
            return Err(DataProcessingError::PipelineAborted.into());
        }
        if state.delivered != self.expected {
            return Err(DataProcessingError::IncompleteOutput {
                delivered: state.delivered,
                expected: self.expected,
            }
            .into());
        }
        Ok(state.sink)
    }
}
