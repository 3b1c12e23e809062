//! Configuration types for the assistant core.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for the conversation pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SirisConfig {
    /// Session persistence settings.
    pub session: SessionConfig,
    /// Response generation settings.
    pub generation: GenerationConfig,
    /// Speech output settings.
    pub speech: SpeechConfig,
    /// Web search settings.
    pub search: SearchConfig,
}

/// Session persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding one JSON file per session.
    pub history_dir: PathBuf,
    /// Cumulative approximate-token ceiling per session. Reaching it
    /// rotates to a fresh session.
    pub max_tokens: u64,
    /// Number of recent messages included in the generation prompt.
    pub context_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_dir: data_dir().join("chat_history"),
            max_tokens: 50_000,
            context_limit: 5,
        }
    }
}

/// Response generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Maximum tokens per assistant response.
    pub max_tokens: usize,
    /// Maximum tokens for the background session-naming completion.
    pub naming_max_tokens: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 200,
            naming_max_tokens: 20,
        }
    }
}

/// Speech output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Voice name passed to the synthesis collaborator.
    pub voice: String,
    /// Output device name (None = system default).
    pub output_device: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            voice: "default".to_owned(),
            output_device: None,
        }
    }
}

/// Web search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Whether user turns are augmented with web search results.
    pub enabled: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Application data root directory.
///
/// Resolves to `dirs::data_dir()/siris/` by default. Override with the
/// `SIRIS_DATA_DIR` environment variable.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SIRIS_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("siris"))
        .unwrap_or_else(|| PathBuf::from("/tmp/siris-data"))
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/siris/` by default. Override with the
/// `SIRIS_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SIRIS_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("siris"))
        .unwrap_or_else(|| PathBuf::from("/tmp/siris-config"))
}

impl SirisConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::SirisError::Config(e.to_string()))
    }

    /// Load configuration from the default path, or defaults when the file
    /// is missing or unreadable.
    ///
    /// Settings load failure is not an error for the application; a bad
    /// file is logged and replaced by defaults.
    #[must_use]
    pub fn load_or_default() -> Self {
        let path = Self::default_config_path();
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                if path.exists() {
                    tracing::warn!("failed to load {}: {e}; using defaults", path.display());
                }
                Self::default()
            }
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SirisError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `{config_dir}/config.toml`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        config_dir().join("config.toml")
    }
}
