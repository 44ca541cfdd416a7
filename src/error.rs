// src/error.rs
//! Error types for the fetch, normalize and probe stages.
//!
//! None of these abort a run. Fetch failures drop one query's results,
//! parse failures drop one entry, probe failures become an annotation on
//! the affected site.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Failure talking to the transparency log search service
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid log search URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("log search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("log search returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode log search response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Which validity timestamp of an entry failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    NotAfter,
    NotBefore,
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeField::NotAfter => write!(f, "not_after"),
            TimeField::NotBefore => write!(f, "not_before"),
        }
    }
}

/// Malformed timestamp on a single log entry
#[derive(Debug, Error)]
#[error("unable to parse {field} {value:?}: {source}")]
pub struct TimeParseError {
    pub field: TimeField,
    pub value: String,
    #[source]
    pub source: chrono::ParseError,
}

/// Failure dialing a site or reading its leaf certificate
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid server name {0:?}")]
    InvalidServerName(String),

    #[error("dial tcp {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tls handshake with {addr}: {source}")]
    Handshake {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("dial tcp {addr}: i/o timeout after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    #[error("unparseable leaf certificate: {0}")]
    Certificate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_parse_error_names_field_and_value() {
        let source = chrono::NaiveDateTime::parse_from_str("not-a-date", "%Y-%m-%dT%H:%M:%S")
            .unwrap_err();
        let err = TimeParseError {
            field: TimeField::NotAfter,
            value: "not-a-date".to_string(),
            source,
        };

        let msg = err.to_string();
        assert!(msg.contains("not_after"));
        assert!(msg.contains("\"not-a-date\""));
    }

    #[test]
    fn test_probe_timeout_message() {
        let err = ProbeError::Timeout {
            addr: "example.com:443".to_string(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(
            err.to_string(),
            "dial tcp example.com:443: i/o timeout after 10s"
        );
    }
}
