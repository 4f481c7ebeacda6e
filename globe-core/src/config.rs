//! TOML configuration. Every field has a default, so an empty document is
//! a valid configuration.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::animation::AnimationConfig;
use crate::error::ConfigError;
use crate::scene::SceneConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub scene: SceneConfig,
    pub animation: AnimationConfig,
}

impl GlobeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        from_toml_str(text)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        load(path)
    }
}

/// Parse any configuration section type from TOML text
pub fn from_toml_str<T: DeserializeOwned>(text: &str) -> Result<T, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// Read and parse a TOML file
pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_toml_str(&text)
}
