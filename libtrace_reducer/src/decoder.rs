use std::path::{Path, PathBuf};
use std::process::Command;

use super::config::Config;
use super::error::{ConfigError, DecodeError};
use super::raw_trigger::DecodedWaveform;

/// The seam to the external waveform decoder.
///
/// Implementations must return `DecodeError::NotFound` when the file does not exist;
/// the enumerator relies on it to find the end of a run. Any other error is treated as
/// a broken file.
pub trait WaveformDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DecodedWaveform, DecodeError>;
}

/// Decodes waveform files by running an external decoder program.
///
/// The program is invoked as `<program> <args...> <path>` and must print a single
/// YAML (or JSON) document to stdout:
///
/// ```yml
/// metadata:
///   horiz_interval: 1.0e-10
///   trigger_time: [2020, 3, 10, 14, 5, 7.25]
/// trigger_times: [0.0]
/// samples:
///   - [0.01, 0.02, 0.35]
/// ```
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandDecoder {
    pub fn new(program: &Path, args: &[String]) -> Self {
        Self {
            program: program.to_path_buf(),
            args: args.to_vec(),
        }
    }

    /// Create the decoder named by the configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        match &config.decoder_program {
            Some(program) => Ok(Self::new(program, &config.decoder_args)),
            None => Err(ConfigError::NoDecoder),
        }
    }
}

impl WaveformDecoder for CommandDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedWaveform, DecodeError> {
        if !path.exists() {
            return Err(DecodeError::NotFound(path.to_path_buf()));
        }

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(|source| DecodeError::Launch {
                program: self.program.clone(),
                path: path.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(DecodeError::DecoderFailed {
                path: path.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_yaml::from_slice::<DecodedWaveform>(&output.stdout).map_err(|source| {
            DecodeError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}
