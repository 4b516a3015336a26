//! Error taxonomy.
//!
//! [`NormalizeError`] is local and recoverable: the offending record is skipped and
//! the rest of the source survives. [`ConfigError`] is fatal to classification but
//! never to fusion.

use thiserror::Error;

/// A single source record that could not be brought into canonical shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("host record has no IP address")]
    MissingIp,

    #[error("'{0}' is not a valid IP address")]
    InvalidIp(String),

    #[error("port record has no port number")]
    MissingPort,

    #[error("'{0}' is not a valid port number")]
    InvalidPort(String),

    #[error("unsupported protocol '{0}' (expected tcp or udp)")]
    InvalidProtocol(String),

    #[error("unrecognized port state '{0}'")]
    InvalidState(String),

    #[error("record does not match the expected shape: {0}")]
    Malformed(String),
}

/// The risk policy could not be loaded or does not make sense.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read policy file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML policy {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to parse JSON policy {path}: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported policy format for {0}: .{1}")]
    UnsupportedFormat(String, String),

    #[error("high_risk_ports: '{0}' is not a port number")]
    InvalidPort(String),

    #[error("high_risk_ports: weight {weight} for port {port} is outside 1..=10")]
    InvalidWeight { port: u16, weight: u8 },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("'{value}' is not a usable version for '{product}'")]
    InvalidVersion { product: String, value: String },

    #[error("outdated_versions: severity '{severity}' for '{product}' must be medium or high")]
    InvalidSeverity { product: String, severity: String },

    #[error("{0}: entry name must not be empty")]
    EmptyName(&'static str),
}
