use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{ConfigError, HistogramError};
use super::histogram::BinEdges;

/// Structure representing the application configuration. Contains pathing, decoder and
/// histogram information.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub channel: String,
    pub start_index: u32,
    pub index_width: usize,
    pub extension: String,
    pub store_name: String,
    pub decoder_program: Option<PathBuf>,
    pub decoder_args: Vec<String>,
    pub cache_capacity: Option<usize>,
    pub n_threads: i32,
    pub bin_low: f64,
    pub bin_high: f64,
    pub n_bin_edges: usize,
}

impl Default for Config {
    /// Generate a new Config object for the standard scope setup (channel C4, pulse
    /// heights up to 3 V). No decoder is set.
    fn default() -> Self {
        Self {
            channel: String::from("C4"),
            start_index: 2,
            index_width: 5,
            extension: String::from("trc"),
            store_name: String::from("data.h5"),
            decoder_program: None,
            decoder_args: vec![],
            cache_capacity: None,
            n_threads: 1,
            bin_low: 0.0,
            bin_high: 3.0,
            n_bin_edges: 30,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Get the path to the waveform file of a trigger, using the scope naming scheme
    /// (i.e. `C4step00002.trc`)
    pub fn get_trigger_path(&self, folder: &Path, channel: &str, index: u32) -> PathBuf {
        folder.join(format!(
            "{channel}step{index:0>width$}.{ext}",
            width = self.index_width,
            ext = self.extension
        ))
    }

    /// Get the path to the column store of a run folder
    pub fn get_store_path(&self, folder: &Path) -> PathBuf {
        folder.join(&self.store_name)
    }

    /// The pulse height binning used for comparisons
    pub fn get_bin_edges(&self) -> Result<BinEdges, HistogramError> {
        BinEdges::linspace(self.bin_low, self.bin_high, self.n_bin_edges)
    }

    pub fn is_n_threads_valid(&self) -> bool {
        self.n_threads >= 1
    }
}
