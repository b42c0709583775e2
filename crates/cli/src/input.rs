//! Reading the configuration file and the invocation envelope from disk.

use std::path::{Path, PathBuf};

use router::{Config, ConfigError, RawConfig};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while reading the files an invocation needs.
#[derive(Debug, Error)]
pub enum InputError {
    /// The file could not be read.
    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the expected keys.
    #[error("Failed to parse configuration file {path}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration parsed but failed validation.
    #[error("Invalid configuration in {path}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    /// The event file is not valid JSON.
    #[error("Failed to parse event file {path}")]
    ParseEvent {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads and validates the YAML configuration file at `path`.
///
/// An empty file is a valid configuration with every key absent.
pub fn load_config(path: &Path) -> Result<Config, InputError> {
    let contents = read(path)?;
    let raw: RawConfig = if contents.trim().is_empty() {
        RawConfig::default()
    } else {
        serde_yaml::from_str(&contents).map_err(|source| InputError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?
    };

    Config::from_raw(raw).map_err(|source| InputError::InvalidConfig {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the invocation envelope from `path`, or returns an empty envelope
/// when no path is given (a smoke-test invocation).
pub fn read_envelope(path: Option<&Path>) -> Result<Value, InputError> {
    let Some(path) = path else {
        return Ok(Value::Object(Default::default()));
    };

    let contents = read(path)?;
    serde_json::from_str(&contents).map_err(|source| InputError::ParseEvent {
        path: path.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
