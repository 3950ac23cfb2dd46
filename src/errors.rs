//! Error types for the exporter

use std::fmt;

pub type Result<T> = std::result::Result<T, ExporterError>;

#[derive(Debug)]
pub enum ExporterError {
    /// IO operation failed
    Io(std::io::Error),

    /// HTTP request failed
    Http(reqwest::Error),

    /// JSON serialization/deserialization failed
    Json(serde_json::Error),

    /// Upstream API answered with a non-success status
    Upstream { status: u16, body: String },

    /// Compliance pattern failed to compile
    Pattern(regex::Error),

    /// Metric construction, registration or encoding failed
    Metrics(prometheus::Error),

    /// Configuration error
    Config(String),
}

impl fmt::Display for ExporterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExporterError::Io(err) => write!(f, "IO error: {}", err),
            ExporterError::Http(err) => write!(f, "HTTP error: {}", err),
            ExporterError::Json(err) => write!(f, "JSON error: {}", err),
            ExporterError::Upstream { status, body } => {
                write!(f, "Upstream returned {}: {}", status, body)
            }
            ExporterError::Pattern(err) => write!(f, "Invalid compliance pattern: {}", err),
            ExporterError::Metrics(err) => write!(f, "Metrics error: {}", err),
            ExporterError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ExporterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExporterError::Io(err) => Some(err),
            ExporterError::Http(err) => Some(err),
            ExporterError::Json(err) => Some(err),
            ExporterError::Pattern(err) => Some(err),
            ExporterError::Metrics(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ExporterError {
    fn from(err: std::io::Error) -> Self {
        ExporterError::Io(err)
    }
}

impl From<reqwest::Error> for ExporterError {
    fn from(err: reqwest::Error) -> Self {
        ExporterError::Http(err)
    }
}

impl From<serde_json::Error> for ExporterError {
    fn from(err: serde_json::Error) -> Self {
        ExporterError::Json(err)
    }
}

impl From<regex::Error> for ExporterError {
    fn from(err: regex::Error) -> Self {
        ExporterError::Pattern(err)
    }
}

impl From<prometheus::Error> for ExporterError {
    fn from(err: prometheus::Error) -> Self {
        ExporterError::Metrics(err)
    }
}
