// src/error.rs
//! Error types for the GNSS monitor

use std::fmt;

pub type Result<T> = std::result::Result<T, GnssError>;

#[derive(Debug)]
pub enum GnssError {
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    Json(serde_json::Error),
    Connection(String),
    /// A sentence field carried a value outside its valid domain
    Value(String),
    Other(String),
}

impl fmt::Display for GnssError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GnssError::Io(e) => write!(f, "IO error: {}", e),
            GnssError::Serial(e) => write!(f, "Serial error: {}", e),
            GnssError::Json(e) => write!(f, "JSON error: {}", e),
            GnssError::Connection(msg) => write!(f, "Connection error: {}", msg),
            GnssError::Value(msg) => write!(f, "Invalid value: {}", msg),
            GnssError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for GnssError {}

impl From<std::io::Error> for GnssError {
    fn from(error: std::io::Error) -> Self {
        GnssError::Io(error)
    }
}

impl From<tokio_serial::Error> for GnssError {
    fn from(error: tokio_serial::Error) -> Self {
        GnssError::Serial(error)
    }
}

impl From<serde_json::Error> for GnssError {
    fn from(error: serde_json::Error) -> Self {
        GnssError::Json(error)
    }
}

impl From<anyhow::Error> for GnssError {
    fn from(error: anyhow::Error) -> Self {
        GnssError::Other(error.to_string())
    }
}
