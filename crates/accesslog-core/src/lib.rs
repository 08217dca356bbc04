//! accesslog-core: load line-delimited JSON access logs into SQLite
//!
//! The pipeline has two stages, run back to back by the `accesslog` binary:
//!
//! 1. [`parse_access_log`] reads a JSONL log produced by a reverse proxy and
//!    decodes every line into a [`LogEntry`]. One bad line fails the whole file.
//! 2. [`insert_logs`] creates the `access_logs` table on demand and writes one
//!    row per entry.
//!
//! ```no_run
//! use accesslog_core::{Config, insert_logs, parse_access_log};
//!
//! fn main() -> accesslog_core::Result<()> {
//!     let config = Config::new("access.log", "access.db");
//!     let logs = parse_access_log(&config.log_file, config.truncate)?;
//!     let stats = insert_logs(&logs, &config.sql_db)?;
//!     println!("{}", stats);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod parser;
pub mod store;

pub use config::{Config, FileConfig, load_file_config};
pub use entry::{BackendUrl, LogEntry};
pub use error::{Error, ErrorKind, Result};
pub use parser::parse_access_log;
pub use store::{InsertStats, count_rows, ensure_schema, insert_logs, open_db};
