//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while reading dataset and model files
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },

    #[error("{path}:{line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for depthview_core::Error {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Io(err) => depthview_core::Error::Io(err),
            IoError::InvalidFormat { format } => depthview_core::Error::UnsupportedFormat(format),
            other => depthview_core::Error::InvalidData(other.to_string()),
        }
    }
}
