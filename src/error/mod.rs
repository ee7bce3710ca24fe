//! Error handling for the IPS map viewer.

pub mod util;

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for loading, joining and rendering the school map
#[derive(Debug, thiserror::Error)]
pub enum IpsMapError {
    /// Error opening or reading a reference file
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// IO error without a known path
    #[error("IO error: {0}")]
    BareIo(#[from] io::Error),

    /// Error decoding Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error from an Arrow compute kernel or CSV decoder
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Malformed boundary dataset
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] Box<geojson::Error>),

    /// A table lacks a column the pipeline needs
    #[error("Column '{column}' not found in {table}")]
    MissingColumn { table: String, column: String },

    /// A column exists but holds an unexpected type
    #[error("Column '{column}' has type {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: String,
        found: String,
    },

    /// The boundary dataset has no feature with the configured name
    #[error("No boundary feature with {key} = {name}")]
    BoundaryNotFound { key: String, name: String },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filter expression could not be evaluated
    #[error("Filter error: {0}")]
    Filter(String),
}

impl From<geojson::Error> for IpsMapError {
    fn from(error: geojson::Error) -> Self {
        Self::GeoJson(Box::new(error))
    }
}

impl From<serde_json::Error> for IpsMapError {
    fn from(error: serde_json::Error) -> Self {
        Self::Config(error.to_string())
    }
}

impl IpsMapError {
    /// Attach a path to an IO error
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a missing-column error for the named table
    pub fn missing_column(table: &str, column: &str) -> Self {
        Self::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

/// Result type for IPS map operations
pub type Result<T> = std::result::Result<T, IpsMapError>;
