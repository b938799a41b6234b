//! # trace_reducer
//!
//! trace_reducer reduces the waveform captures of a digital oscilloscope into compact
//! per-trigger features, and compares the pulse height spectra of runs. A run is a folder
//! of waveform files written one per trigger by the scope (`C4step00002.trc`,
//! `C4step00003.trc`, ...). The run has no recorded length; it ends at the first missing
//! index.
//!
//! Processing happens in two steps:
//!
//! - preprocess: every trigger of a run is decoded, its scalar metadata and pulse height
//! are collected into columns, and the columns are written to an HDF5 store in the run
//! folder.
//! - compare: the stores of a background run and a signal run are reloaded, the pulse
//! heights histogrammed into rates (Hz) with Poisson errors, and the (S+B)/B ratio taken.
//!
//! ## Waveform Decoding
//!
//! trace_reducer does not read the scope's binary format itself. Files are handed to an
//! external decoder program, invoked as `<decoder_program> <decoder_args...> <file>`,
//! which must print a single YAML (or JSON) document to stdout:
//!
//! ```yml
//! metadata:
//!   horiz_interval: 2.0e-10
//!   acq_vert_offset: 0.05
//!   trigger_time: [2020.0, 3.0, 10.0, 14.0, 5.0, 33.25]
//!   instrument_name: LECROY
//! trigger_times: [0.0]
//! samples:
//!   - [0.01, 0.02, 0.35, 0.12]
//! ```
//!
//! `horiz_interval` (seconds per sample) and `trigger_time` (year, month, day, hour,
//! minute, fractional seconds) are required. Other code can supply its own decoder by
//! implementing the `WaveformDecoder` trait.
//!
//! ## Configuration
//!
//! The YAML format of a configuration file is as follows:
//!
//! ```yml
//! channel: C4
//! start_index: 2
//! index_width: 5
//! extension: trc
//! store_name: data.h5
//! decoder_program: /path/to/decoder
//! decoder_args: []
//! cache_capacity: null
//! n_threads: 1
//! bin_low: 0.0
//! bin_high: 3.0
//! n_bin_edges: 30
//! ```
//!
//! A `cache_capacity` of `null` keeps every decoded trigger in memory for the lifetime of
//! the process. Setting it bounds the cache, evicting the least recently used triggers.
//!
//! ## Output
//!
//! ### HDF5 Data Format
//!
//! ```text
//! data.h5
//! data - version, n_triggers
//! |---- acq_vert_offset(dset)
//! |---- horiz_interval(dset)
//! |---- pulse_height(dset)
//! |---- trigger_time(dset)
//! |---- ...one dataset per scalar metadata field
//! ```
//!
//! Every dataset has one entry per trigger. `trigger_time` is stored as seconds since the
//! Unix epoch, treating the scope clock as UTC.
pub mod column_store;
pub mod comparison;
pub mod config;
pub mod decoder;
pub mod duration;
pub mod enumerator;
pub mod error;
pub mod exporter;
pub mod feature_table;
pub mod histogram;
pub mod process;
pub mod raw_trigger;
pub mod timestamp;
pub mod trace;
pub mod trigger_cache;
pub mod trigger_source;
pub mod worker_status;

#[cfg(test)]
pub(crate) mod testing;
