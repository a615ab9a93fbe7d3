//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\tunefetch\config.toml
//! - macOS: ~/Library/Application Support/tunefetch/config.toml
//! - Linux: ~/.config/tunefetch/config.toml
//!
//! Every section is optional; missing keys take their defaults. Command-line
//! flags and the `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET` environment
//! variables take precedence over the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::acquire::AcquireConfig;
use crate::batch::DEFAULT_CONCURRENCY;
use crate::matching::MatchConfig;
use crate::media::{AudioFormat, FetchOptions};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog API credentials
    pub credentials: Credentials,

    /// Candidate acceptance thresholds
    pub matching: MatchConfig,

    /// Search and download settings
    pub download: DownloadConfig,

    /// External tool locations
    pub tools: ToolsConfig,

    /// Where results go
    pub output: OutputConfig,
}

/// Spotify application credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
}

impl Credentials {
    /// Merge explicit values (flags or environment) over the file values.
    ///
    /// Blank strings count as missing.
    pub fn resolve(
        &self,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> (Option<String>, Option<String>) {
        fn pick(explicit: Option<&str>, stored: &Option<String>) -> Option<String> {
            explicit
                .or(stored.as_deref())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        }
        (
            pick(client_id, &self.spotify_client_id),
            pick(client_secret, &self.spotify_client_secret),
        )
    }
}

/// Search and download settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Tracks acquired at the same time
    pub concurrency: usize,

    /// Candidates requested per search
    pub search_limit: usize,

    /// Codec yt-dlp extracts to (mp3, m4a, opus, vorbis, flac, alac, wav)
    pub audio_format: AudioFormat,

    /// Output bitrate in kbps
    pub bitrate_kbps: u32,

    pub search_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            search_limit: 5,
            audio_format: AudioFormat::Mp3,
            bitrate_kbps: 192,
            search_timeout_secs: 60,
            fetch_timeout_secs: 600,
        }
    }
}

impl DownloadConfig {
    pub fn acquire_config(&self) -> AcquireConfig {
        AcquireConfig {
            search_limit: self.search_limit.max(1),
            fetch: FetchOptions {
                audio_format: self.audio_format,
                bitrate_kbps: self.bitrate_kbps,
            },
            search_timeout: Duration::from_secs(self.search_timeout_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
        }
    }
}

/// External tool locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// yt-dlp executable (name on PATH or absolute path)
    pub ytdlp_path: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Parent directory for per-entity download folders
    pub directory: PathBuf,

    /// Zip the download folder when the run finishes
    pub archive: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            archive: true,
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tunefetch"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from a specific file, falling back to defaults
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to a specific file
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
