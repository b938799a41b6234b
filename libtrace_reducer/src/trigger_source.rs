use fxhash::FxHashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::config::Config;
use super::decoder::WaveformDecoder;
use super::enumerator::TraceEnumerator;
use super::error::{DecodeError, TriggerSourceError};
use super::raw_trigger::RawTrigger;
use super::trigger_cache::{LruCache, TriggerCache, TriggerKey, UnboundedCache};

struct CacheState {
    cache: Box<dyn TriggerCache>,
    confirmed: FxHashSet<TriggerKey>, // every key ever decoded successfully
}

/// TriggerSource resolves, decodes, and memoizes trigger files.
///
/// Construct one per top-level invocation. Decoding is the expensive step, and the same
/// trigger is often read by several analyses, so every decoded trigger is kept in the
/// cache and repeated requests return the same `Arc`.
///
/// The source can be shared between threads. The cache lock is never held while
/// decoding; if two threads decode the same trigger at once, the first one stored wins.
pub struct TriggerSource {
    config: Config,
    decoder: Arc<dyn WaveformDecoder>,
    state: Mutex<CacheState>,
}

impl TriggerSource {
    /// Create a new TriggerSource with the cache named by the configuration
    /// (unbounded unless `cache_capacity` is set)
    pub fn new(config: &Config, decoder: Arc<dyn WaveformDecoder>) -> Self {
        let cache: Box<dyn TriggerCache> = match config.cache_capacity {
            Some(capacity) => Box::new(LruCache::new(capacity)),
            None => Box::new(UnboundedCache::new()),
        };
        Self::with_cache(config, decoder, cache)
    }

    pub fn with_cache(
        config: &Config,
        decoder: Arc<dyn WaveformDecoder>,
        cache: Box<dyn TriggerCache>,
    ) -> Self {
        Self {
            config: config.clone(),
            decoder,
            state: Mutex::new(CacheState {
                cache,
                confirmed: FxHashSet::default(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the decoded trigger with the given index.
    ///
    /// A missing file is `TriggerSourceError::NotFound`, unless this trigger was decoded
    /// before, in which case it is `Vanished`.
    pub fn get_trigger(
        &self,
        folder: &Path,
        channel: &str,
        index: u32,
    ) -> Result<Arc<RawTrigger>, TriggerSourceError> {
        let key = TriggerKey::new(folder, channel, index);
        if let Some(trigger) = self.lock_state().cache.get(&key) {
            return Ok(trigger);
        }

        let path = self.config.get_trigger_path(folder, channel, index);
        let waveform = match self.decoder.decode(&path) {
            Ok(waveform) => waveform,
            Err(DecodeError::NotFound(_)) => {
                return if self.lock_state().confirmed.contains(&key) {
                    Err(TriggerSourceError::Vanished {
                        folder: key.folder,
                        channel: key.channel,
                        index,
                    })
                } else {
                    Err(TriggerSourceError::NotFound {
                        folder: key.folder,
                        channel: key.channel,
                        index,
                    })
                };
            }
            Err(source) => return Err(self.decode_error(&key, source)),
        };

        let trigger = match RawTrigger::try_from(waveform) {
            Ok(trigger) => Arc::new(trigger),
            Err(source) => {
                return Err(self.decode_error(&key, DecodeError::Malformed { path, source }))
            }
        };

        log::debug!("Decoded trigger {} from {:?}", index, path);
        let mut state = self.lock_state();
        state.confirmed.insert(key.clone());
        Ok(state.cache.insert_if_absent(key, trigger))
    }

    /// Enumerate the triggers of a run, starting at the configured start index.
    ///
    /// See [TraceEnumerator].
    pub fn enumerate(
        &self,
        folder: &Path,
        channel: &str,
        limit: Option<usize>,
    ) -> TraceEnumerator<'_> {
        TraceEnumerator::new(self, folder, channel, self.config.start_index, limit)
    }

    /// Number of triggers currently held in the cache
    pub fn cached_triggers(&self) -> usize {
        self.lock_state().cache.len()
    }

    fn decode_error(&self, key: &TriggerKey, source: DecodeError) -> TriggerSourceError {
        TriggerSourceError::Decode {
            folder: key.folder.clone(),
            channel: key.channel.clone(),
            index: key.index,
            source,
        }
    }

    // A poisoned lock still guards a usable cache
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
