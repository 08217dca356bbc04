//! JSONL access log reader.
//!
//! Every line must be a complete JSON value. A single malformed line fails the
//! whole file, so callers either get every entry or none.
//!
//! Nesting is capped at [`MAX_DEPTH`] levels of arrays and objects; deeper
//! lines count as invalid.

use crate::entry::LogEntry;
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

/// Deepest array/object nesting accepted on one line.
pub const MAX_DEPTH: usize = 512;

/// Read `path` and decode one [`LogEntry`] per line, in file order.
///
/// When `truncate` is set the file is emptied in place once every line has
/// parsed. This destroys the log immediately: if a later stage fails, the
/// entries exist only in the returned `Vec`.
pub fn parse_access_log(path: &Path, truncate: bool) -> Result<Vec<LogEntry>> {
    let file = OpenOptions::new()
        .read(true)
        .write(truncate)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    let mut reader = BufReader::new(file);

    let mut logs = Vec::new();
    let mut buf = Vec::new();
    let mut line_num = 0;
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| Error::io(path, e))?;
        if n == 0 {
            break;
        }
        line_num += 1;
        let line = trim_line_ending(&buf);
        let value = decode_line(line).ok_or_else(|| Error::Parse {
            line: line_num,
            raw: line.to_vec(),
        })?;
        logs.push(LogEntry::from_value(&value));
    }
    log::debug!("parsed {} entries from {}", logs.len(), path.display());

    if truncate {
        truncate_file(reader.get_mut()).map_err(|e| Error::io(path, e))?;
        log::warn!("truncated {}", path.display());
    }

    Ok(logs)
}

/// Parse one line as a single JSON value, or `None` if it is not valid JSON.
fn decode_line(line: &[u8]) -> Option<Value> {
    if nesting_depth(line) > MAX_DEPTH {
        return None;
    }
    let mut de = serde_json::Deserializer::from_slice(line);
    // serde_json's own limit is 128; MAX_DEPTH above bounds the recursion instead.
    de.disable_recursion_limit();
    let value = Value::deserialize(&mut de).ok()?;
    de.end().ok()?;
    Some(value)
}

/// Maximum bracket depth, ignoring brackets inside strings.
fn nesting_depth(line: &[u8]) -> usize {
    let mut depth = 0usize;
    let mut max = 0;
    let mut in_string = false;
    let mut escaped = false;
    for &b in line {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                max = max.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

/// Strip the trailing `\n` and, if present, one `\r` before it.
fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn truncate_file(file: &mut File) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.set_len(0)
}
