//! Configuration loading for Lintra.
//!
//! Configuration is TOML with every field optional; prompt files are
//! opaque text read verbatim, once, at startup. Nothing here reaches for
//! ambient globals: the loaded value is passed explicitly into the backend
//! constructor.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use lintra_types::{DEFAULT_CHUNK_SIZE, ModelParams, ProviderKind, SweepStrategy};

const CONFIG_FILE: &str = "lintra.toml";

/// Default bound on analysis attempts per cycle.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Process configuration, deserialized from `lintra.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LintraConfig {
    /// Which text-generation service to use.
    pub backend: ProviderKind,
    /// How a document sweep is decomposed into requests.
    pub strategy: SweepStrategy,
    /// Path to the static system prompt.
    pub prompt_file: PathBuf,
    /// Path to the corrective instruction used on retry attempts.
    pub retry_prompt_file: PathBuf,
    /// Run a connectivity self-test during startup.
    pub connect_test: bool,
    /// Document lines per provider request.
    pub chunk_size: usize,
    /// Analysis attempts per cycle before giving up.
    pub max_attempts: u32,
    /// Model tuning knobs.
    pub model: ModelParams,
}

impl Default for LintraConfig {
    fn default() -> Self {
        Self {
            backend: ProviderKind::default(),
            strategy: SweepStrategy::default(),
            prompt_file: PathBuf::from("prompts/prompt_base.txt"),
            retry_prompt_file: PathBuf::from("prompts/prompt_retry.txt"),
            connect_test: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            model: ModelParams::default(),
        }
    }
}

impl LintraConfig {
    /// Load configuration from an explicit path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load from the user config directory, falling back to defaults when
    /// no file exists there.
    pub fn load_default() -> Result<Self, ConfigError> {
        let Some(path) = default_config_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lintra").join(CONFIG_FILE))
}

/// Read a prompt file verbatim; its content is opaque to every layer.
pub fn load_prompt(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}
