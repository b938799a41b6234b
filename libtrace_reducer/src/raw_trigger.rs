use ndarray::{s, Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::WaveformError;
use super::timestamp::TriggerTimestamp;

/// Metadata key holding the seconds per sample
pub const HORIZ_INTERVAL_KEY: &str = "horiz_interval";
/// Metadata key holding the 6 component trigger timestamp
pub const TRIGGER_TIME_KEY: &str = "trigger_time";

/// A single metadata value as reported by the waveform decoder.
///
/// Only `Integer` and `Float` are scalars; everything else is carried along but never
/// exported. Values of any other shape (booleans, nulls, nested or mixed sequences)
/// land in `Other` rather than failing the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Integer(i64),
    Float(f64),
    Array(Vec<f64>),
    Text(String),
    Other(serde_yaml::Value),
}

/// A scalar metadata value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
}

impl Scalar {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Integer(i) => *i as f64,
            Self::Float(f) => *f,
        }
    }
}

impl MetaValue {
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Integer(i) => Some(Scalar::Integer(*i)),
            Self::Float(f) => Some(Scalar::Float(*f)),
            _ => None,
        }
    }
}

/// The raw output of a waveform decoder for one file.
///
/// `samples` holds one row per captured segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedWaveform {
    pub metadata: BTreeMap<String, MetaValue>,
    #[serde(default)]
    pub trigger_times: Vec<f64>,
    pub samples: Vec<Vec<f64>>,
}

/// One decoded trigger. Immutable once built.
///
/// The samples of every segment are stored back to back so that a trace can view them
/// without copying. The horizontal interval and trigger timestamp are validated when the
/// trigger is built, so a `RawTrigger` always has both.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrigger {
    metadata: BTreeMap<String, MetaValue>,
    trigger_times: Vec<f64>,
    samples: Array1<f64>,
    segment_length: usize,
    horiz_interval: f64,
    timestamp: TriggerTimestamp,
}

impl TryFrom<DecodedWaveform> for RawTrigger {
    type Error = WaveformError;

    fn try_from(waveform: DecodedWaveform) -> Result<Self, Self::Error> {
        let horiz_interval = match waveform.metadata.get(HORIZ_INTERVAL_KEY) {
            Some(value) => value
                .as_scalar()
                .ok_or_else(|| WaveformError::BadField(HORIZ_INTERVAL_KEY.to_string()))?
                .as_f64(),
            None => return Err(WaveformError::MissingField(HORIZ_INTERVAL_KEY.to_string())),
        };
        if !(horiz_interval.is_finite() && horiz_interval > 0.0) {
            return Err(WaveformError::BadInterval(horiz_interval));
        }

        let timestamp = match waveform.metadata.get(TRIGGER_TIME_KEY) {
            Some(MetaValue::Array(components)) => TriggerTimestamp::from_components(components)?,
            Some(_) => return Err(WaveformError::BadField(TRIGGER_TIME_KEY.to_string())),
            None => return Err(WaveformError::MissingField(TRIGGER_TIME_KEY.to_string())),
        };

        let segment_length = waveform.samples.first().map_or(0, |row| row.len());
        if let Some(row) = waveform.samples.iter().find(|row| row.len() != segment_length) {
            return Err(WaveformError::RaggedSamples(segment_length, row.len()));
        }
        let samples: Array1<f64> = waveform.samples.into_iter().flatten().collect();

        Ok(Self {
            metadata: waveform.metadata,
            trigger_times: waveform.trigger_times,
            samples,
            segment_length,
            horiz_interval,
            timestamp,
        })
    }
}

impl RawTrigger {
    pub fn metadata(&self) -> &BTreeMap<String, MetaValue> {
        &self.metadata
    }

    pub fn trigger_times(&self) -> &[f64] {
        &self.trigger_times
    }

    /// All samples, segment after segment
    pub fn samples(&self) -> ArrayView1<'_, f64> {
        self.samples.view()
    }

    pub fn n_segments(&self) -> usize {
        if self.segment_length == 0 {
            0
        } else {
            self.samples.len() / self.segment_length
        }
    }

    /// The samples of a single segment, if it exists
    pub fn segment(&self, segment: usize) -> Option<ArrayView1<'_, f64>> {
        if segment >= self.n_segments() {
            return None;
        }
        let start = segment * self.segment_length;
        Some(self.samples.slice(s![start..start + self.segment_length]))
    }

    /// Seconds per sample
    pub fn horiz_interval(&self) -> f64 {
        self.horiz_interval
    }

    pub fn timestamp(&self) -> &TriggerTimestamp {
        &self.timestamp
    }
}
