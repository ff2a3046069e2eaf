//! Dataset handling for the timeline visual
//!
//! Turns the host's categorical dataset into ordered timeline items.

pub mod config;
pub mod dataset;
pub mod item;
pub mod mapper;
pub mod sources;
pub mod temporal;

use arrow::error::ArrowError;
use thiserror::Error;

// Re-exports
pub use config::{MappingPlaceholders, NullConfig};
pub use dataset::{CategoricalView, ColumnRole, DatasetColumn};
pub use item::{Group, Item, MappedTimeline, TimeValue};
pub use mapper::RowMapper;

/// Errors that can occur while reading or mapping a dataset
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    /// The snapshot or one of its recognized columns is absent
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Recognized columns disagree on the row count
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

impl From<csv::Error> for DataError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => DataError::Io(std::io::Error::new(io_err.kind(), error.to_string())),
            _ => DataError::Csv(error.to_string()),
        }
    }
}
