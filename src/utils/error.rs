//! Error types for run setup.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.
//! Failures that happen while a task executes are [`crate::worker::TaskError`]s and
//! never surface through these types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use serde::Serialize;

/// Validation errors for inputs and configuration.
#[derive(Error, Debug, Serialize)]
pub enum ValidationError {
    /// Path-related validation error
    #[error("Path error: {0}")]
    Path(#[from] PathError),
    /// Invalid configuration value
    #[error("Settings error: {0}")]
    Settings(String),
}

/// File path errors.
#[derive(Error, Debug, Serialize)]
pub enum PathError {
    /// File or directory does not exist
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    /// Directory walk found nothing that can be processed
    #[error("No supported images in {0}")]
    NoImages(PathBuf),
}

/// Main error type for preparing a run.
///
/// Covers everything that can go wrong before the scheduler starts: parsing
/// options, validating the configuration, discovering models and inputs.
#[derive(Error, Debug, Serialize)]
pub enum UpscaleError {
    /// Input or configuration validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),

    /// Unsupported or invalid image format
    #[error("Format error: {0}")]
    Format(String),

    /// Unknown option value (resize mode, filter name)
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Convenience result type for run setup.
pub type UpscaleResult<T> = Result<T, UpscaleError>;

// Helper methods for error creation
impl UpscaleError {
    pub fn format<T: Into<String>>(msg: T) -> Self {
        Self::Format(msg.into())
    }

    pub fn invalid_value<T: Into<String>>(msg: T) -> Self {
        Self::InvalidValue(msg.into())
    }

    pub fn settings<T: Into<String>>(msg: T) -> Self {
        Self::Validation(ValidationError::settings(msg))
    }
}

// Helper methods for validation error creation
impl ValidationError {
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::Path(PathError::NotFound(path.into()))
    }

    pub fn no_images(path: impl Into<PathBuf>) -> Self {
        Self::Path(PathError::NoImages(path.into()))
    }

    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }
}

// Convert std::io::Error to UpscaleError
impl From<io::Error> for UpscaleError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

impl From<walkdir::Error> for UpscaleError {
    fn from(err: walkdir::Error) -> Self {
        Self::IO(err.to_string())
    }
}

// Convert PathError to UpscaleError
impl From<PathError> for UpscaleError {
    fn from(err: PathError) -> Self {
        Self::Validation(ValidationError::Path(err))
    }
}
