//! Workload and configuration loading.
//!
//! This module reads the JSON inputs of a simulation run. It performs:
//! 1. **File reading:** Maps I/O failures to [`SimError::Io`] with the offending path.
//! 2. **Parsing:** Maps schema errors to [`SimError::Parse`].

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use super::workload::Workload;
use crate::common::SimError;
use crate::config::Config;

/// Reads a workload from a JSON file.
///
/// # Errors
///
/// [`SimError::Io`] if the file cannot be read, [`SimError::Parse`] if it is
/// not a valid workload.
pub fn load_workload(path: impl AsRef<Path>) -> Result<Workload, SimError> {
    load_json(path.as_ref())
}

/// Reads a configuration from a JSON file.
///
/// # Errors
///
/// [`SimError::Io`] if the file cannot be read, [`SimError::Parse`] if it is
/// not a valid configuration.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, SimError> {
    load_json(path.as_ref())
}

/// Parses a workload from a JSON string; `origin` names the source in errors.
///
/// # Errors
///
/// [`SimError::Parse`] if `json` is not a valid workload.
pub fn parse_workload(json: &str, origin: &str) -> Result<Workload, SimError> {
    serde_json::from_str(json).map_err(|source| SimError::Parse {
        path: origin.to_string(),
        source,
    })
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, SimError> {
    let text = fs::read_to_string(path).map_err(|source| SimError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SimError::Parse {
        path: path.display().to_string(),
        source,
    })
}
