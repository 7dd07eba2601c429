use hitime::errors::Result;
use hitime::store::SpectrumSink;
use hitime::Spectrum;
use indicatif::{
    ProgressBar,
    ProgressStyle,
};

/// Sink adapter that advances a progress bar on every spectrum written.
///
/// Spectra reach the sink in order, so the bar tracks written output rather
/// than scored-but-queued spectra.
pub struct ProgressSink<K> {
    inner: K,
    bar: ProgressBar,
}

impl<K: SpectrumSink> ProgressSink<K> {
    pub fn new(inner: K, len: usize) -> Self {
        let bar = ProgressBar::new(len as u64);
        match ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
        ) {
            Ok(style) => bar.set_style(style),
            Err(e) => tracing::warn!("Invalid progress template: {}", e),
        }
        Self { inner, bar }
    }
}

impl<K: SpectrumSink> SpectrumSink for ProgressSink<K> {
    fn consume(&mut self, spectrum: Spectrum) -> Result<()> {
        self.inner.consume(spectrum)?;
        self.bar.inc(1);
        Ok(())
    }

    fn finish(self) -> Result<()> {
        self.bar.finish();
        self.inner.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hitime::store::CollectingSink;

    #[test]
    fn test_progress_sink_forwards() {
        let mut collected = CollectingSink::new();
        let mut sink = ProgressSink::new(&mut collected, 2);
        for i in 0..2 {
            sink.consume(Spectrum::try_new(i, vec![1.0], vec![2.0]).unwrap())
                .unwrap();
        }
        assert_eq!(sink.bar.position(), 2);
        sink.finish().unwrap();
        assert_eq!(collected.delivered_indices(), vec![0, 1]);
    }
}
