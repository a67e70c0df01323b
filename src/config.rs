use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;

const DEFAULT_PASS_MULTIPLIER: usize = 3;
const DEFAULT_SAVE_FAILURE_MESSAGE: &str = "failed to save";

/// Tunables for a `FormEngine`. Every field has a default, so an empty JSON
/// object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The convergence loop stops after this many passes per declared rule.
    pub pass_multiplier: usize,
    /// Shown to the user when a save fails without a message of its own.
    pub save_failure_message: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pass_multiplier: DEFAULT_PASS_MULTIPLIER,
            save_failure_message: DEFAULT_SAVE_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    /// Load a config from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.pass_multiplier == 0 {
            return Err(ConfigError::Invalid(
                "pass_multiplier must be at least 1".to_string(),
            ));
        }
        if self.save_failure_message.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "save_failure_message must not be blank".to_string(),
            ));
        }
        Ok(self)
    }
}
