use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::TriggerSourceError;
use super::raw_trigger::RawTrigger;
use super::trace::{to_trace, Trace};
use super::trigger_source::TriggerSource;

/// A trigger produced by a TraceEnumerator, along with its file index
#[derive(Debug, Clone)]
pub struct EnumeratedTrigger {
    pub index: u32,
    pub trigger: Arc<RawTrigger>,
}

impl EnumeratedTrigger {
    pub fn trace(&self) -> Trace<'_> {
        to_trace(&self.trigger)
    }
}

/// Walks the triggers of a run in index order.
///
/// A run has no recorded length; it is every file from the start index up to the first
/// missing one. The enumerator asks the TriggerSource for consecutive indices and ends
/// quietly at the first `NotFound`. Any other error is handed out once, after which the
/// enumerator is ended. An optional limit caps the number of triggers produced.
///
/// Enumerators are not restartable. Ask the TriggerSource for a new one to scan again;
/// already decoded triggers come from the cache.
pub struct TraceEnumerator<'a> {
    source: &'a TriggerSource,
    folder: PathBuf,
    channel: String,
    next_index: u32,
    limit: Option<usize>,
    n_produced: usize,
    is_ended: bool,
}

impl<'a> TraceEnumerator<'a> {
    pub fn new(
        source: &'a TriggerSource,
        folder: &Path,
        channel: &str,
        start_index: u32,
        limit: Option<usize>,
    ) -> Self {
        Self {
            source,
            folder: folder.to_path_buf(),
            channel: channel.to_string(),
            next_index: start_index,
            limit,
            n_produced: 0,
            is_ended: false,
        }
    }

    /// Get the next trigger in the run
    ///
    /// Returns a `Result<Option<EnumeratedTrigger>>`. The Option is None if the run has
    /// no more triggers.
    pub fn next_trigger(&mut self) -> Result<Option<EnumeratedTrigger>, TriggerSourceError> {
        if self.is_ended {
            return Ok(None);
        }
        if self.limit.is_some_and(|limit| self.n_produced >= limit) {
            self.is_ended = true;
            return Ok(None);
        }

        let index = self.next_index;
        match self
            .source
            .get_trigger(&self.folder, &self.channel, index)
        {
            Ok(trigger) => {
                self.next_index += 1;
                self.n_produced += 1;
                Ok(Some(EnumeratedTrigger { index, trigger }))
            }
            Err(TriggerSourceError::NotFound { .. }) => {
                log::debug!(
                    "End of run {:?} channel {} after {} triggers",
                    self.folder,
                    self.channel,
                    self.n_produced
                );
                self.is_ended = true;
                Ok(None)
            }
            Err(e) => {
                self.is_ended = true;
                Err(e)
            }
        }
    }

    /// Number of triggers produced so far
    pub fn n_produced(&self) -> usize {
        self.n_produced
    }
}

impl Iterator for TraceEnumerator<'_> {
    type Item = Result<EnumeratedTrigger, TriggerSourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_trigger().transpose()
    }
}

impl FusedIterator for TraceEnumerator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::{make_waveform, MemoryDecoder};

    fn make_run(config: &Config, n_triggers: usize) -> (Arc<MemoryDecoder>, TriggerSource) {
        let decoder = Arc::new(MemoryDecoder::new());
        let waveforms = (0..n_triggers)
            .map(|i| make_waveform(&[i as f64], i as f64))
            .collect();
        decoder.add_run(config, Path::new("run"), "C4", waveforms);
        let source = TriggerSource::new(config, decoder.clone());
        (decoder, source)
    }

    #[test]
    fn test_enumerates_until_gap() {
        let config = Config::default();
        let (decoder, source) = make_run(&config, 5);
        // A trigger after the gap must never be reached
        decoder.insert(
            config.get_trigger_path(Path::new("run"), "C4", 8),
            Some(make_waveform(&[9.0], 9.0)),
        );

        let triggers: Vec<_> = source
            .enumerate(Path::new("run"), "C4", None)
            .collect::<Result<_, _>>()
            .unwrap();
        let indices: Vec<u32> = triggers.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![2, 3, 4, 5, 6]);
        assert_eq!(triggers[4].trace().samples.to_vec(), vec![4.0]);
    }

    #[test]
    fn test_start_index_is_configurable() {
        let config = Config {
            start_index: 1,
            ..Default::default()
        };
        let (_, source) = make_run(&config, 3);
        let indices: Vec<u32> = source
            .enumerate(Path::new("run"), "C4", None)
            .map(|t| t.unwrap().index)
            .collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_limit() {
        let config = Config::default();
        let (decoder, source) = make_run(&config, 5);
        let mut enumerator = source.enumerate(Path::new("run"), "C4", Some(2));
        assert_eq!(enumerator.next_trigger().unwrap().unwrap().index, 2);
        assert_eq!(enumerator.next_trigger().unwrap().unwrap().index, 3);
        assert!(enumerator.next_trigger().unwrap().is_none());
        assert_eq!(decoder.calls(), 2);
    }

    #[test]
    fn test_empty_run() {
        let config = Config::default();
        let (_, source) = make_run(&config, 0);
        let mut enumerator = source.enumerate(Path::new("run"), "C4", None);
        assert!(enumerator.next().is_none());
        assert!(enumerator.next().is_none());
    }

    #[test]
    fn test_decode_error_ends_enumeration() {
        let config = Config::default();
        let (decoder, source) = make_run(&config, 4);
        decoder.insert(config.get_trigger_path(Path::new("run"), "C4", 3), None);

        let mut enumerator = source.enumerate(Path::new("run"), "C4", None);
        assert!(enumerator.next().unwrap().is_ok());
        assert!(matches!(
            enumerator.next(),
            Some(Err(TriggerSourceError::Decode { index: 3, .. }))
        ));
        assert!(enumerator.next().is_none());
    }

    #[test]
    fn test_rescan_uses_cache() {
        let config = Config::default();
        let (decoder, source) = make_run(&config, 3);
        assert_eq!(source.enumerate(Path::new("run"), "C4", None).count(), 3);
        // 3 triggers plus the probe for the missing fourth
        assert_eq!(decoder.calls(), 4);
        assert_eq!(source.enumerate(Path::new("run"), "C4", None).count(), 3);
        // Only the missing file is probed again
        assert_eq!(decoder.calls(), 5);
    }
}
