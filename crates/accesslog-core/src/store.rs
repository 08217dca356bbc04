//! SQLite storage for access log entries.
//!
//! The `access_logs` table keeps a fixed projection of [`LogEntry`]: 25 columns
//! plus an `id` assigned by SQLite. Everything else on the entry is dropped.
//! There are no migrations; the table is created if missing and otherwise
//! left alone.

use crate::entry::LogEntry;
use crate::error::{Error, Result};
use rusqlite::{Connection, params};
use std::path::Path;

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS access_logs (
        id                    INTEGER PRIMARY KEY,
        BackendName           TEXT,
        BackendURLScheme      TEXT,
        BackendURLHost        TEXT,
        ClientAddr            TEXT,
        ClientHost            TEXT,
        ClientPort            TEXT,
        ClientUsername        TEXT,
        DownstreamStatus      INTEGER,
        DownstreamContentSize INTEGER,
        Duration              INTEGER,
        FrontendName          TEXT,
        OriginContentSize     INTEGER,
        OriginDuration        INTEGER,
        RequestAddr           TEXT,
        RequestContentSize    INTEGER,
        RequestCount          INTEGER,
        RequestHost           TEXT,
        RequestMethod         TEXT,
        RequestPath           TEXT,
        RequestPort           TEXT,
        RequestProtocol       TEXT,
        StartUTC              TEXT,
        RequestReferer        TEXT,
        RequestUserAgent      TEXT,
        Time                  TEXT
    );
";

const INSERT_ROW: &str = "
    INSERT INTO access_logs (
        BackendName, BackendURLScheme, BackendURLHost, ClientAddr, ClientHost,
        ClientPort, ClientUsername, DownstreamStatus, DownstreamContentSize, Duration,
        FrontendName, OriginContentSize, OriginDuration, RequestAddr, RequestContentSize,
        RequestCount, RequestHost, RequestMethod, RequestPath, RequestPort,
        RequestProtocol, StartUTC, RequestReferer, RequestUserAgent, Time
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
        ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25
    )
";

/// Result of a successful [`insert_logs`] run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsertStats {
    pub inserted: usize,
}

impl std::fmt::Display for InsertStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Inserted {} log entries", self.inserted)
    }
}

/// Open (or create) the database at `path` and make sure `access_logs` exists.
pub fn open_db(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .map_err(|e| Error::storage("unable to open sqlite database", e))?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create `access_logs` if it does not exist yet. Safe to call on every run.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLE)
        .map_err(|e| Error::storage("unable to create access_logs table", e))
}

/// Write one row per entry, in order, to the database at `db_path`.
///
/// All rows go in a single transaction: if any row fails, the error names its
/// index in `logs` and nothing from this run is kept.
pub fn insert_logs(logs: &[LogEntry], db_path: &Path) -> Result<InsertStats> {
    let mut conn = open_db(db_path)?;
    let tx = conn
        .transaction()
        .map_err(|e| Error::storage("unable to begin transaction", e))?;
    {
        let mut stmt = tx
            .prepare(INSERT_ROW)
            .map_err(|e| Error::storage("unable to prepare SQL statement", e))?;
        for (index, log) in logs.iter().enumerate() {
            stmt.execute(params![
                log.backend_name,
                log.backend_url.scheme,
                log.backend_url.host,
                log.client_addr,
                log.client_host,
                log.client_port,
                log.client_username,
                log.downstream_status,
                log.downstream_content_size,
                log.duration,
                log.frontend_name,
                log.origin_content_size,
                log.origin_duration,
                log.request_addr,
                log.request_content_size,
                log.request_count,
                log.request_host,
                log.request_method,
                log.request_path,
                log.request_port,
                log.request_protocol,
                log.start_utc,
                log.request_referer,
                log.request_user_agent,
                log.time,
            ])
            .map_err(|e| Error::Storage {
                context: "unable to insert log entry",
                row: Some(index),
                source: e,
            })?;
        }
    }
    tx.commit()
        .map_err(|e| Error::storage("unable to commit log entries", e))?;

    log::debug!("inserted {} rows into {}", logs.len(), db_path.display());
    Ok(InsertStats {
        inserted: logs.len(),
    })
}

/// Number of rows currently in `access_logs`.
pub fn count_rows(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM access_logs", [], |row| row.get(0))
        .map_err(|e| Error::storage("unable to count access_logs rows", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::BackendUrl;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn entry(name: &str, status: i64, duration: i64) -> LogEntry {
        LogEntry {
            backend_name: name.to_string(),
            downstream_status: status,
            duration,
            ..Default::default()
        }
    }

    #[test]
    fn open_db_creates_table() {
        let dir = TempDir::new().unwrap();
        let conn = open_db(&dir.path().join("test.db")).unwrap();

        let columns: Vec<String> = conn
            .prepare("SELECT name FROM pragma_table_info('access_logs') ORDER BY cid")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();

        assert_eq!(columns.len(), 26);
        assert_eq!(columns[0], "id");
        assert_eq!(columns[1], "BackendName");
        assert_eq!(columns[22], "StartUTC");
        assert_eq!(columns[25], "Time");
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");

        insert_logs(&[entry("a", 200, 1)], &db_path).unwrap();
        let conn = open_db(&db_path).unwrap();
        ensure_schema(&conn).unwrap();

        assert_eq!(count_rows(&conn).unwrap(), 1);
    }

    #[test]
    fn rows_follow_input_order() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");
        let logs = vec![entry("a", 200, 15), entry("b", 404, 3), entry("c", 500, 7)];

        let stats = insert_logs(&logs, &db_path).unwrap();
        assert_eq!(stats.inserted, 3);

        let conn = open_db(&db_path).unwrap();
        let rows: Vec<(i64, String, i64, i64)> = conn
            .prepare("SELECT id, BackendName, DownstreamStatus, Duration FROM access_logs ORDER BY id")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();

        assert_eq!(
            rows,
            vec![
                (1, "a".to_string(), 200, 15),
                (2, "b".to_string(), 404, 3),
                (3, "c".to_string(), 500, 7),
            ]
        );
    }

    #[test]
    fn projects_backend_url_scheme_and_host() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");
        let log = LogEntry {
            backend_url: BackendUrl {
                scheme: "https".to_string(),
                host: "10.0.0.9:443".to_string(),
                path: "/dropped".to_string(),
                ..Default::default()
            },
            request_user_agent: "curl/8.0".to_string(),
            request_referer: "https://example.com/".to_string(),
            start_utc: "2024-01-02T03:04:05Z".to_string(),
            time: "2024-01-02T03:04:05Z".to_string(),
            ..Default::default()
        };

        insert_logs(&[log], &db_path).unwrap();

        let conn = open_db(&db_path).unwrap();
        type Projected = (String, String, String, String, String, String);
        let (scheme, host, agent, referer, start, time): Projected = conn
            .query_row(
                "SELECT BackendURLScheme, BackendURLHost, RequestUserAgent, RequestReferer, StartUTC, Time
                 FROM access_logs",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?)),
            )
            .unwrap();
        assert_eq!(scheme, "https");
        assert_eq!(host, "10.0.0.9:443");
        assert_eq!(agent, "curl/8.0");
        assert_eq!(referer, "https://example.com/");
        assert_eq!(start, "2024-01-02T03:04:05Z");
        assert_eq!(time, "2024-01-02T03:04:05Z");
    }

    #[test]
    fn unset_fields_are_stored_as_zero_values() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");

        insert_logs(&[entry("a", 200, 1)], &db_path).unwrap();

        let conn = open_db(&db_path).unwrap();
        let (client, size): (String, i64) = conn
            .query_row(
                "SELECT ClientAddr, OriginContentSize FROM access_logs",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(client, "");
        assert_eq!(size, 0);
    }

    #[test]
    fn appends_across_runs() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");

        insert_logs(&[entry("a", 200, 1)], &db_path).unwrap();
        insert_logs(&[entry("b", 200, 2), entry("c", 200, 3)], &db_path).unwrap();

        let conn = open_db(&db_path).unwrap();
        assert_eq!(count_rows(&conn).unwrap(), 3);
    }

    #[test]
    fn empty_input_still_creates_table() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");

        let stats = insert_logs(&[], &db_path).unwrap();
        assert_eq!(stats, InsertStats { inserted: 0 });

        let conn = open_db(&db_path).unwrap();
        assert_eq!(count_rows(&conn).unwrap(), 0);
    }

    #[test]
    fn failing_row_rolls_back_the_run() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");
        insert_logs(&[entry("kept", 200, 1)], &db_path).unwrap();

        // Reject one specific backend so the second row of the next run fails.
        let conn = open_db(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER reject_bad BEFORE INSERT ON access_logs
             WHEN NEW.BackendName = 'bad'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();
        drop(conn);

        let err = insert_logs(
            &[entry("ok", 200, 1), entry("bad", 500, 2), entry("never", 200, 3)],
            &db_path,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(matches!(err, Error::Storage { row: Some(1), .. }));

        let conn = open_db(&db_path).unwrap();
        let names: Vec<String> = conn
            .prepare("SELECT BackendName FROM access_logs ORDER BY id")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(names, ["kept"]);
    }

    #[test]
    fn unopenable_path_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("missing-dir").join("test.db");

        let err = insert_logs(&[entry("a", 200, 1)], &db_path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
