//! Compiler and player settings
//!
//! Settings can be embedded in a host's own TOML configuration:
//!
//! ```toml
//! max_include_depth = 4
//! random_seed = 1234
//! warn_unrecognized = false
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use crate::parser::{Error, Result, DEFAULT_MAX_INCLUDE_DEPTH};
use serde::{Deserialize, Serialize};

/// Settings for loading instruments and building voice players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// How deep `#include` directives may nest
    pub max_include_depth: usize,
    /// Seed for weighted-random players; `None` seeds from the OS
    pub random_seed: Option<u64>,
    /// Log the first sighting of each unknown opcode at warn level
    pub warn_unrecognized: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            random_seed: None,
            warn_unrecognized: true,
        }
    }
}

impl SamplerConfig {
    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SamplerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize settings to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_include_depth > 64 {
            return Err(Error::Config(format!(
                "max_include_depth {} is larger than 64",
                self.max_include_depth
            )));
        }
        Ok(())
    }
}
