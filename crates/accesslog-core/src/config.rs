//! Pipeline configuration.
//!
//! [`Config`] is what the stages run with. [`FileConfig`] is the optional TOML
//! file a frontend can merge underneath its own flags; every key is optional
//! there, and unknown keys are rejected so typos surface early.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Line-delimited JSON access log to read.
    pub log_file: PathBuf,
    /// SQLite database to write, created if absent.
    pub sql_db: PathBuf,
    /// Empty the log file once it has parsed. Irreversible.
    pub truncate: bool,
}

impl Config {
    pub fn new(log_file: impl Into<PathBuf>, sql_db: impl Into<PathBuf>) -> Self {
        Self {
            log_file: log_file.into(),
            sql_db: sql_db.into(),
            truncate: false,
        }
    }
}

/// Contents of a TOML config file, e.g.
///
/// ```toml
/// log_file = "/var/log/traefik/access.log"
/// sql_db = "/var/lib/accesslog/access.db"
/// truncate = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub sql_db: Option<PathBuf>,
    #[serde(default)]
    pub truncate: Option<bool>,
}

/// Read and parse a TOML config file.
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    toml::from_str(&content).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        source: e,
    })
}
