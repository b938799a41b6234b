use std::path::PathBuf;
use thiserror::Error;

use super::worker_status::WorkerStatus;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TimestampError {
    #[error("Trigger timestamp must have 6 components (year, month, day, hour, minute, seconds); found {0}")]
    BadLength(usize),
    #[error("Trigger timestamp component {0} is not a finite number")]
    NotFinite(usize),
    #[error("Trigger timestamp does not form a valid date or time: {0}")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WaveformError {
    #[error("Waveform is missing required metadata field {0}")]
    MissingField(String),
    #[error("Waveform metadata field {0} has the wrong type")]
    BadField(String),
    #[error("Waveform horizontal interval {0} is not a positive finite number")]
    BadInterval(f64),
    #[error("Waveform segments have unequal lengths ({0} and {1})")]
    RaggedSamples(usize, usize),
    #[error("Waveform has a bad trigger timestamp: {0}")]
    BadTimestamp(#[from] TimestampError),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Waveform file {0:?} does not exist")]
    NotFound(PathBuf),
    #[error("Could not launch waveform decoder {program:?} for {path:?}: {source}")]
    Launch {
        program: PathBuf,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Waveform decoder failed on {path:?} with {status}: {stderr}")]
    DecoderFailed {
        path: PathBuf,
        status: String,
        stderr: String,
    },
    #[error("Waveform decoder produced unreadable output for {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Waveform file {path:?} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        source: WaveformError,
    },
}

#[derive(Debug, Error)]
pub enum TriggerSourceError {
    #[error("Trigger {index} of channel {channel} in {folder:?} does not exist")]
    NotFound {
        folder: PathBuf,
        channel: String,
        index: u32,
    },
    #[error("Trigger {index} of channel {channel} in {folder:?} was read before but has since disappeared")]
    Vanished {
        folder: PathBuf,
        channel: String,
        index: u32,
    },
    #[error("Trigger {index} of channel {channel} in {folder:?} could not be decoded: {source}")]
    Decode {
        folder: PathBuf,
        channel: String,
        index: u32,
        source: DecodeError,
    },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeatureError {
    #[error("Cannot find the pulse height of an empty trace")]
    EmptyTrace,
}

#[derive(Debug, Error)]
pub enum DurationError {
    #[error("Run duration needs at least 2 triggers; found {0}")]
    InsufficientData(usize),
    #[error("Run duration failed due to trigger source error: {0}")]
    SourceError(#[from] TriggerSourceError),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum HistogramError {
    #[error("Histogram bin edges must be at least 2 finite, strictly increasing values")]
    InvalidEdges,
    #[error("Histogram rates need a positive, finite duration; got {0}")]
    InvalidDuration(f64),
    #[error("Histograms have different bin edges ({0} edges vs {1} edges, or differing values)")]
    DimensionMismatch(usize, usize),
    #[error("Histogram has {found} counts or rates for {n_bins} bins")]
    CountMismatch { found: usize, n_bins: usize },
}

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Exporter failed due to trigger source error: {0}")]
    SourceError(#[from] TriggerSourceError),
    #[error("Exporter failed due to feature error on trigger {index}: {source}")]
    FeatureError { index: u32, source: FeatureError },
    #[error("Exporter found no triggers for channel {channel} in {folder:?}")]
    EmptyRun { folder: PathBuf, channel: String },
    #[error("Metadata field {field} is present on {present} of {expected} triggers; columns must be row-aligned")]
    RaggedField {
        field: String,
        present: usize,
        expected: usize,
    },
}

#[derive(Debug, Error)]
pub enum ColumnStoreError {
    #[error("ColumnStore failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("ColumnStore failed to encode a string attribute: {0}")]
    StringError(#[from] hdf5::types::StringError),
    #[error("ColumnStore failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not open column store because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Column {0} has a type which cannot be loaded as a numeric column")]
    UnsupportedType(String),
    #[error("Column {column} has {found} rows; the store records {expected} triggers")]
    CorruptStore {
        column: String,
        found: usize,
        expected: usize,
    },
    #[error("Cannot store column {column} with {found} rows in a table of {expected} rows")]
    MisalignedTable {
        column: String,
        found: usize,
        expected: usize,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config does not name a decoder_program; waveform files cannot be read")]
    NoDecoder,
}

#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error("Comparison failed due to ColumnStore error: {0}")]
    StoreError(#[from] ColumnStoreError),
    #[error("Run {run} has no {column} column")]
    MissingColumn { run: String, column: String },
    #[error("Run {run} has columns of unequal length")]
    MisalignedColumns { run: String },
    #[error("Comparison failed due to duration error: {0}")]
    DurationError(#[from] DurationError),
    #[error("Comparison failed due to histogram error: {0}")]
    HistogramError(#[from] HistogramError),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Exporter error: {0}")]
    ExporterError(#[from] ExporterError),
    #[error("Processor failed due to ColumnStore error: {0}")]
    StoreError(#[from] ColumnStoreError),
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
    #[error("Processor failed due to IO error: {0}")]
    IoError(#[from] std::io::Error),
}
