// Configuration loading
//
// Priority (highest first): CLI flags, YAML config file, compiled defaults.
// A missing default config file is not an error; an explicit path that does
// not exist is.

use crate::kv::{FileKv, KvStore, SqliteKv};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "tasklist";
const CONFIG_FILE: &str = "config.yaml";
const DB_FILE: &str = "tasklist.db";

/// Which persistence medium holds the task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the stored data
    pub data_dir: PathBuf,
    pub backend: Backend,
    /// Maximum log level written to stderr (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: Backend::default(),
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load from an explicit path, or from the default location when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(eyre!("Config file not found: {}", path.display()));
                }
                Self::from_file(path)
            }
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(path = ?path, "Loaded config");
        Ok(config)
    }

    /// Open the configured persistence medium
    pub fn open_kv(&self) -> Result<Box<dyn KvStore>> {
        match self.backend {
            Backend::File => Ok(Box::new(FileKv::open(&self.data_dir)?)),
            Backend::Sqlite => Ok(Box::new(SqliteKv::open(self.data_dir.join(DB_FILE))?)),
        }
    }

    pub fn log_level(&self) -> Result<tracing::Level> {
        self.log_level
            .parse()
            .map_err(|_| eyre!("Invalid log level: {}", self.log_level))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".tasklist"))
}
