//! Unified error types for the viewer.

use std::fmt;

/// Application-specific errors.
#[derive(Debug)]
pub enum AppError {
    /// No column of the dataset looks like it holds images
    NoImageColumnFound,
    /// The data file could not be read or parsed
    DatasetLoad(String),
    /// Sorting or filtering could not be applied to the current values
    FilterOrSort(String),
    /// An image path does not name a readable file
    FileMissing(String),
    /// Image data was present but could not be decoded
    Decode(String),
    /// A drag-export source could not be produced
    Export(String),
    /// Settings could not be read or written
    Settings(String),
    /// The decode worker pool could not be started
    WorkerPool(String),
    /// A command-line argument was malformed
    InvalidArgument(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NoImageColumnFound => write!(f, "No image column found"),
            AppError::DatasetLoad(msg) => write!(f, "Failed to load dataset: {}", msg),
            AppError::FilterOrSort(msg) => write!(f, "Failed to update view: {}", msg),
            AppError::FileMissing(path) => write!(f, "File missing: {}", path),
            AppError::Decode(msg) => write!(f, "Image decode error: {}", msg),
            AppError::Export(msg) => write!(f, "Export error: {}", msg),
            AppError::Settings(msg) => write!(f, "Settings error: {}", msg),
            AppError::WorkerPool(msg) => write!(f, "Worker pool error: {}", msg),
            AppError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<parquet::errors::ParquetError> for AppError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        AppError::DatasetLoad(err.to_string())
    }
}

impl From<arrow::error::ArrowError> for AppError {
    fn from(err: arrow::error::ArrowError) -> Self {
        AppError::DatasetLoad(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Settings(err.to_string())
    }
}

/// Type alias for Results in this application.
pub type Result<T> = std::result::Result<T, AppError>;
