//! Error taxonomy shared by every pipeline stage.

use std::path::PathBuf;

/// Everything that can stop a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The log file (or config file) could not be opened, read or truncated.
    #[error("unable to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A log line is not valid JSON. Carries the raw bytes of the line.
    #[error("line {line} contains invalid json: {}", escape_raw(.raw))]
    Parse { line: usize, raw: Vec<u8> },

    /// The database rejected an open, schema or insert call.
    #[error("{context}{}: {source}", row_suffix(.row))]
    Storage {
        context: &'static str,
        row: Option<usize>,
        #[source]
        source: rusqlite::Error,
    },

    /// The TOML config file is malformed.
    #[error("invalid config file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Coarse error category, for callers that only care which stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    Storage,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. } => ErrorKind::Io,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::Storage { .. } => ErrorKind::Storage,
            Error::Config { .. } => ErrorKind::Config,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn storage(context: &'static str, source: rusqlite::Error) -> Self {
        Error::Storage {
            context,
            row: None,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Render raw line bytes as a quoted, escaped string. Invalid UTF-8 is shown as `\xNN`.
fn escape_raw(raw: &[u8]) -> String {
    format!("\"{}\"", raw.escape_ascii())
}

fn row_suffix(row: &Option<usize>) -> String {
    match row {
        Some(index) => format!(" (row {})", index),
        None => String::new(),
    }
}
