//! In-memory stand-ins for the waveform decoder, used by the unit tests.

use fxhash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::Config;
use crate::decoder::WaveformDecoder;
use crate::error::{DecodeError, WaveformError};
use crate::raw_trigger::{DecodedWaveform, MetaValue, HORIZ_INTERVAL_KEY, TRIGGER_TIME_KEY};

/// A single segment waveform with a 1 s sample interval, triggered `offset_seconds`
/// after 2020-03-10 00:00:00
pub(crate) fn make_waveform(samples: &[f64], offset_seconds: f64) -> DecodedWaveform {
    let hours = (offset_seconds / 3600.0).floor();
    let minutes = ((offset_seconds - hours * 3600.0) / 60.0).floor();
    let seconds = offset_seconds - hours * 3600.0 - minutes * 60.0;
    let mut waveform = DecodedWaveform {
        samples: vec![samples.to_vec()],
        trigger_times: vec![0.0],
        ..Default::default()
    };
    waveform
        .metadata
        .insert(HORIZ_INTERVAL_KEY.to_string(), MetaValue::Float(1.0));
    waveform.metadata.insert(
        TRIGGER_TIME_KEY.to_string(),
        MetaValue::Array(vec![2020.0, 3.0, 10.0, hours, minutes, seconds]),
    );
    waveform
}

/// Decoder over an in-memory file table that counts how often it is asked to decode.
///
/// A path mapped to `None` is present on "disk" but corrupt.
#[derive(Debug, Default)]
pub(crate) struct MemoryDecoder {
    files: Mutex<FxHashMap<PathBuf, Option<DecodedWaveform>>>,
    calls: AtomicUsize,
}

impl MemoryDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store waveforms under contiguous indices starting at the configured start index
    pub(crate) fn add_run(
        &self,
        config: &Config,
        folder: &Path,
        channel: &str,
        waveforms: Vec<DecodedWaveform>,
    ) {
        for (offset, waveform) in waveforms.into_iter().enumerate() {
            let path = config.get_trigger_path(folder, channel, config.start_index + offset as u32);
            self.insert(path, Some(waveform));
        }
    }

    pub(crate) fn insert(&self, path: PathBuf, waveform: Option<DecodedWaveform>) {
        self.files.lock().unwrap().insert(path, waveform);
    }

    pub(crate) fn remove(&self, path: &Path) {
        self.files.lock().unwrap().remove(path);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WaveformDecoder for MemoryDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedWaveform, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.files.lock().unwrap().get(path) {
            Some(Some(waveform)) => Ok(waveform.clone()),
            Some(None) => Err(DecodeError::Malformed {
                path: path.to_path_buf(),
                source: WaveformError::MissingField(HORIZ_INTERVAL_KEY.to_string()),
            }),
            None => Err(DecodeError::NotFound(path.to_path_buf())),
        }
    }
}
