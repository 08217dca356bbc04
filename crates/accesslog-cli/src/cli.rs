//! Command-line arguments and their resolution into a pipeline [`Config`].

use accesslog_core::{Config, FileConfig, load_file_config};
use clap::Parser;
use std::path::PathBuf;

/// Load a line-delimited JSON access log into a SQLite database.
#[derive(Parser, Debug, Default)]
#[command(name = "accesslog", version, about)]
pub struct Cli {
    // Plain strings: clap's PathBuf parser rejects empty values.
    /// Path to the access log file (one JSON object per line).
    #[arg(long = "log_file", visible_alias = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,

    /// Path to the SQLite database (created if absent).
    #[arg(long = "sql_db", visible_alias = "sql-db", value_name = "PATH")]
    pub sql_db: Option<String>,

    /// Truncate the log file after reading it.
    #[arg(long)]
    pub truncate: bool,

    /// TOML file supplying defaults for the options above.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr (RUST_LOG takes precedence).
    #[arg(short, long)]
    pub verbose: bool,
}

/// Why a [`Cli`] could not be turned into a [`Config`].
#[derive(Debug)]
pub enum ResolveError {
    MissingLogFile,
    MissingSqlDb,
    Config(accesslog_core::Error),
}

impl Cli {
    /// Merge flags over the config file (if any). Flags win.
    pub fn resolve(&self) -> Result<Config, ResolveError> {
        let file = match &self.config {
            Some(path) => load_file_config(path).map_err(ResolveError::Config)?,
            None => FileConfig::default(),
        };
        merge(self, file)
    }
}

/// An empty flag counts as unset and falls through to the file value.
fn pick_path(flag: Option<&str>, file: Option<PathBuf>) -> Option<PathBuf> {
    flag.filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or(file)
        .filter(|p| !p.as_os_str().is_empty())
}

fn merge(cli: &Cli, file: FileConfig) -> Result<Config, ResolveError> {
    let log_file = pick_path(cli.log_file.as_deref(), file.log_file)
        .ok_or(ResolveError::MissingLogFile)?;
    let sql_db =
        pick_path(cli.sql_db.as_deref(), file.sql_db).ok_or(ResolveError::MissingSqlDb)?;

    let mut config = Config::new(log_file, sql_db);
    config.truncate = cli.truncate || file.truncate.unwrap_or(false);
    Ok(config)
}
