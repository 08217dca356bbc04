// accesslog: CLI frontend for accesslog-core
// Flag parsing, logging setup, and the parse -> insert sequence

mod cli;

use accesslog_core::{count_rows, insert_logs, open_db, parse_access_log};
use clap::Parser;
use cli::{Cli, ResolveError};
use std::path::Path;
use std::process::ExitCode;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Summary line with the table's total size. Best effort: the insert already succeeded.
fn log_table_size(db: &Path) {
    match open_db(db).and_then(|conn| count_rows(&conn)) {
        Ok(total) => log::info!("access_logs now holds {} rows", total),
        Err(e) => log::warn!("unable to count rows in {}: {}", db.display(), e),
    }
}

fn main() -> ExitCode {
    let args = Cli::parse();
    init_logging(args.verbose);

    let config = match args.resolve() {
        Ok(config) => config,
        Err(ResolveError::MissingLogFile) => {
            println!("No log file specified, exiting.");
            return ExitCode::FAILURE;
        }
        Err(ResolveError::MissingSqlDb) => {
            println!("No sql DB specified, exiting.");
            return ExitCode::FAILURE;
        }
        Err(ResolveError::Config(e)) => {
            println!("Unable to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    log::debug!("resolved config: {:?}", config);

    println!("Parsing access logs from {}", config.log_file.display());
    let logs = match parse_access_log(&config.log_file, config.truncate) {
        Ok(logs) => logs,
        Err(e) => {
            println!("Unable to parse log file: {}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!("parsed {} log entries", logs.len());

    println!("Inserting logs to sql database");
    match insert_logs(&logs, &config.sql_db) {
        Ok(stats) => {
            println!("{}", stats);
            log_table_size(&config.sql_db);
            ExitCode::SUCCESS
        }
        Err(e) => {
            // The log may already be truncated at this point; its entries are lost.
            if config.truncate {
                log::warn!(
                    "{} was truncated before the failed insert",
                    config.log_file.display()
                );
            }
            println!("Error inserting logs to database: {}", e);
            ExitCode::FAILURE
        }
    }
}
