use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::anomaly::DetectorConfig;
use crate::error::EngineError;
use crate::region::Geography;

pub const CONFIG_ENV: &str = "CLARITYCARE_CONFIG";

/// Engine configuration. Missing sections fall back to the India defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub detector: DetectorConfig,
    pub geography: Geography,
}

impl EngineConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Reads the file named by `CLARITYCARE_CONFIG`, or the defaults when unset.
    pub fn from_env() -> Result<Self, EngineError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }
}
