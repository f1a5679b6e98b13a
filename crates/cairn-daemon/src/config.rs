//! Configuration file management.
//!
//! `config.toml` lives in the data directory; a missing file means pure
//! defaults. The renderer and blob sections hold credentials for the two
//! external collaborators. Left empty, the daemon still runs and serves
//! capsules; narration render attempts fail and are absorbed, so reads
//! come back without an audio reference.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use cairn_render::blob::BlobConfig;
use cairn_render::tts::TtsConfig;

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub blobs: BlobsConfig,
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Storage paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory override. Empty means the platform default.
    #[serde(default)]
    pub data_dir: String,
}

/// Narration renderer (text-to-speech) credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Synthesis endpoint URL.
    #[serde(default)]
    pub endpoint: String,
    /// API key sent with every synthesis request.
    #[serde(default)]
    pub api_key: String,
    /// Narration language code.
    #[serde(default = "default_language")]
    pub language: String,
    /// Voice style name.
    #[serde(default = "default_style")]
    pub style: String,
}

/// Blob storage credentials for rendered audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobsConfig {
    /// Upload endpoint URL.
    #[serde(default)]
    pub endpoint: String,
    /// Public base URL that stored artifacts are served from.
    #[serde(default)]
    pub public_base_url: String,
    /// Bearer token for uploads and deletes.
    #[serde(default)]
    pub access_token: String,
}

/// Advanced settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level for the daemon's own spans (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            language: default_language(),
            style: default_style(),
        }
    }
}

impl Default for BlobsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            public_base_url: String::new(),
            access_token: String::new(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_language() -> String {
    "ko".to_string()
}

fn default_style() -> String {
    "neutral".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from the default path, or defaults if absent.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Path to the configuration file.
    pub fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Effective data directory: the configured override, or the platform
    /// default.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Platform data directory, overridable via `CAIRN_DATA_DIR`.
    pub fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("CAIRN_DATA_DIR") {
            return PathBuf::from(dir);
        }

        #[cfg(target_os = "linux")]
        {
            dirs_fallback().join(".local/share/cairn")
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback().join("Library/Application Support/cairn")
        }
        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            dirs_fallback().join(".cairn")
        }
    }

    /// Renderer settings in the form the render crate consumes.
    pub fn tts_config(&self) -> TtsConfig {
        TtsConfig {
            endpoint: self.renderer.endpoint.clone(),
            api_key: self.renderer.api_key.clone(),
            language: self.renderer.language.clone(),
            style: self.renderer.style.clone(),
        }
    }

    /// Blob store settings in the form the render crate consumes.
    pub fn blob_config(&self) -> BlobConfig {
        BlobConfig {
            endpoint: self.blobs.endpoint.clone(),
            public_base_url: self.blobs.public_base_url.clone(),
            access_token: self.blobs.access_token.clone(),
        }
    }
}

fn dirs_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp/cairn"))
}
