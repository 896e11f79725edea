use crate::chunker::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `upload.max_file_size_mb`
pub const MAX_SIZE_ENV: &str = "STUDYWISE_MAX_FILE_SIZE_MB";

/// Application configuration loaded from settings.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    /// Keep URL downloads here instead of a scratch directory
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Parent of the scratch directories used for URL downloads
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

fn default_max_file_size_mb() -> u64 {
    10
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            download_dir: None,
            temp_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.upload.download_dir = config.upload.download_dir.map(expand_path);
        config.upload.temp_dir = config.upload.temp_dir.map(expand_path);

        Ok(config)
    }

    /// Load configuration from the default locations, or defaults if none exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            PathBuf::from("config/settings.toml"),
            expand_path(PathBuf::from("~/.config/studywise/settings.toml")),
        ];

        let mut config = match default_paths.iter().find(|path| path.exists()) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;

        Ok(config)
    }

    /// Apply environment overrides on top of the file values
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(MAX_SIZE_ENV) {
            self.upload.max_file_size_mb = value
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of megabytes, got {:?}", MAX_SIZE_ENV, value))?;
        }
        Ok(())
    }
}

fn expand_path(path: PathBuf) -> PathBuf {
    match path.to_str() {
        Some(raw) => PathBuf::from(shellexpand::tilde(raw).into_owned()),
        None => path,
    }
}
