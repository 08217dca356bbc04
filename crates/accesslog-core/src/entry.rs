//! Access log record types and lenient JSON decoding.
//!
//! Log lines come from a reverse proxy whose field set drifts between versions,
//! so decoding never rejects a well-formed JSON value: unknown keys are ignored,
//! and missing, `null` or wrong-typed keys fall back to `""` / `0`.

use serde_json::Value;

static EMPTY: Value = Value::Null;

/// Zero-value accessors for JSON objects.
///
/// Non-objects behave like an empty object, so every accessor returns the zero value.
trait LenientExt {
    /// String value, or `""` if missing or not a string.
    fn text(&self, key: &str) -> String;

    /// Integer value, or `0` if missing, fractional, out of range or not a number.
    fn int(&self, key: &str) -> i64;

    /// Nested object value, or `Value::Null` (which reads as an empty object).
    fn object(&self, key: &str) -> &Value;
}

impl LenientExt for Value {
    fn text(&self, key: &str) -> String {
        self.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn int(&self, key: &str) -> i64 {
        self.get(key).and_then(Value::as_i64).unwrap_or(0)
    }

    fn object(&self, key: &str) -> &Value {
        match self.get(key) {
            Some(v @ Value::Object(_)) => v,
            _ => &EMPTY,
        }
    }
}

/// Parsed form of the proxy's `BackendURL` object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendUrl {
    pub scheme: String,
    pub opaque: String,
    pub user: String,
    pub host: String,
    pub path: String,
    pub raw_path: String,
    pub force_query: String,
    pub raw_query: String,
    pub fragment: String,
}

impl BackendUrl {
    fn from_value(v: &Value) -> Self {
        Self {
            scheme: v.text("Scheme"),
            opaque: v.text("Opaque"),
            user: v.text("User"),
            host: v.text("Host"),
            path: v.text("Path"),
            raw_path: v.text("RawPath"),
            force_query: v.text("ForceQuery"),
            raw_query: v.text("RawQuery"),
            fragment: v.text("Fragment"),
        }
    }
}

/// One proxied request/response cycle, as written on a single log line.
///
/// Header fields carry the proxy's `request_`, `origin_` and `downstream_`
/// prefixes in JSON (e.g. `request_User-Agent`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogEntry {
    pub backend_addr: i64,
    pub backend_name: String,
    pub backend_url: BackendUrl,
    pub client_addr: String,
    pub client_host: String,
    pub client_port: String,
    pub client_username: String,
    pub downstream_content_size: i64,
    pub downstream_status: i64,
    pub downstream_status_line: String,
    pub duration: i64,
    pub frontend_name: String,
    pub origin_content_size: i64,
    pub origin_duration: i64,
    pub origin_status: i64,
    pub origin_status_line: String,
    pub overhead: i64,
    pub request_addr: String,
    pub request_content_size: i64,
    pub request_count: i64,
    pub request_host: String,
    pub request_line: String,
    pub request_method: String,
    pub request_path: String,
    pub request_port: String,
    pub request_protocol: String,
    pub retry_attempts: i64,
    pub start_local: String,
    pub start_utc: String,
    pub downstream_content_type: String,
    pub downstream_date: String,
    pub level: String,
    pub msg: String,
    pub origin_content_type: String,
    pub origin_date: String,
    pub request_accept: String,
    pub request_accept_encoding: String,
    pub request_accept_language: String,
    pub request_access_control_allow_origin: String,
    pub request_authorization: String,
    pub request_dnt: String,
    pub request_referer: String,
    pub request_user_agent: String,
    pub time: String,
}

impl LogEntry {
    /// Build an entry from any JSON value. Never fails; see the module docs.
    pub fn from_value(v: &Value) -> Self {
        Self {
            backend_addr: v.int("BackendAddr"),
            backend_name: v.text("BackendName"),
            backend_url: BackendUrl::from_value(v.object("BackendURL")),
            client_addr: v.text("ClientAddr"),
            client_host: v.text("ClientHost"),
            client_port: v.text("ClientPort"),
            client_username: v.text("ClientUsername"),
            downstream_content_size: v.int("DownstreamContentSize"),
            downstream_status: v.int("DownstreamStatus"),
            downstream_status_line: v.text("DownstreamStatusLine"),
            duration: v.int("Duration"),
            frontend_name: v.text("FrontendName"),
            origin_content_size: v.int("OriginContentSize"),
            origin_duration: v.int("OriginDuration"),
            origin_status: v.int("OriginStatus"),
            origin_status_line: v.text("OriginStatusLine"),
            overhead: v.int("Overhead"),
            request_addr: v.text("RequestAddr"),
            request_content_size: v.int("RequestContentSize"),
            request_count: v.int("RequestCount"),
            request_host: v.text("RequestHost"),
            request_line: v.text("RequestLine"),
            request_method: v.text("RequestMethod"),
            request_path: v.text("RequestPath"),
            request_port: v.text("RequestPort"),
            request_protocol: v.text("RequestProtocol"),
            retry_attempts: v.int("RetryAttempts"),
            start_local: v.text("StartLocal"),
            start_utc: v.text("StartUTC"),
            downstream_content_type: v.text("downstream_Content-Type"),
            downstream_date: v.text("downstream_Date"),
            level: v.text("level"),
            msg: v.text("msg"),
            origin_content_type: v.text("origin_Content-Type"),
            origin_date: v.text("origin_Date"),
            request_accept: v.text("request_Accept"),
            request_accept_encoding: v.text("request_Accept-Encoding"),
            request_accept_language: v.text("request_Accept-Language"),
            request_access_control_allow_origin: v.text("request_Access-Control-Allow-Origin"),
            request_authorization: v.text("request_Authorization"),
            request_dnt: v.text("request_Dnt"),
            request_referer: v.text("request_Referer"),
            request_user_agent: v.text("request_User-Agent"),
            time: v.text("time"),
        }
    }
}
