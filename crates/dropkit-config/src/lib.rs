//! Run configuration for the dropkit binaries.
//! Reads a TOML file named by `--config` or the DROPKIT_CONFIG env var; defaults otherwise.

use std::path::{Path, PathBuf};

use dropkit_common::{DropkitError, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "DROPKIT_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Per-sample cutoff for the top-hit rule.
    #[serde(default = "default_top_hits")]
    pub top_hits: usize,
}

fn default_top_hits() -> usize { 20 }

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { top_hits: default_top_hits() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_gzip_level")]
    pub gzip_level: u32,
}

fn default_output_dir() -> PathBuf { PathBuf::from(".") }
fn default_gzip_level() -> u32 { 6 }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            gzip_level: default_gzip_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String { "dropkit=info,warn".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}


impl Config {
    /// Load configuration.
    /// An explicit path wins over DROPKIT_CONFIG; with neither, defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        };

        let config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DropkitError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| DropkitError::io(path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| DropkitError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.selection.top_hits == 0 {
            return Err(DropkitError::Config(
                "selection.top_hits must be at least 1".to_string(),
            ));
        }
        if self.output.gzip_level > 9 {
            return Err(DropkitError::Config(format!(
                "output.gzip_level must be between 0 and 9, got {}",
                self.output.gzip_level
            )));
        }
        Ok(())
    }
}
