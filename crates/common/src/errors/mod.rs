//! Error types for the Poutine Index pipeline
//!
//! Every error in this module is fatal for a run. Per-entry validation
//! failures are not errors; they are rejections carried in the validator's
//! outcome type.
//!
//! Provides:
//! - Distinct error variants for each fatal failure mode
//! - Machine-readable error codes
//! - Process exit code mapping

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors (1xxx)
    FileNotFound,
    UnreadableFile,
    InvalidJson,
    SchemaViolation,

    // Reference data errors (2xxx)
    InvalidReferenceData,
    MissingMinimumWage,
    DuplicateCity,

    // Output errors (3xxx)
    WriteFailed,

    // Internal errors (9xxx)
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::FileNotFound => 1001,
            ErrorCode::UnreadableFile => 1002,
            ErrorCode::InvalidJson => 1003,
            ErrorCode::SchemaViolation => 1004,

            ErrorCode::InvalidReferenceData => 2001,
            ErrorCode::MissingMinimumWage => 2002,
            ErrorCode::DuplicateCity => 2003,

            ErrorCode::WriteFailed => 3001,

            ErrorCode::ConfigurationError => 9001,
            ErrorCode::SerializationError => 9002,
        }
    }
}

/// A single document-level schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// Where in the document the violation sits, e.g. `prices[3]`
    pub location: String,
    pub message: String,
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Schema violation in {} ({} found), first at {}", .path.display(), .violations.len(), first_violation(.violations))]
    SchemaViolation {
        path: PathBuf,
        violations: Vec<SchemaViolation>,
    },

    // Reference data errors
    #[error("Invalid reference data in {}: {message}", .path.display())]
    InvalidReferenceData { path: PathBuf, message: String },

    #[error("No minimum wage for province {province} (city {city})")]
    MissingMinimumWage { city: String, province: String },

    #[error("City {city} is configured more than once")]
    DuplicateCity { city: String },

    // Output errors
    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn first_violation(violations: &[SchemaViolation]) -> String {
    violations
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "(unknown)".to_string())
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::FileNotFound { .. } => ErrorCode::FileNotFound,
            AppError::UnreadableFile { .. } => ErrorCode::UnreadableFile,
            AppError::InvalidJson { .. } => ErrorCode::InvalidJson,
            AppError::SchemaViolation { .. } => ErrorCode::SchemaViolation,
            AppError::InvalidReferenceData { .. } => ErrorCode::InvalidReferenceData,
            AppError::MissingMinimumWage { .. } => ErrorCode::MissingMinimumWage,
            AppError::DuplicateCity { .. } => ErrorCode::DuplicateCity,
            AppError::WriteFailed { .. } => ErrorCode::WriteFailed,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Process exit code for this error
    ///
    /// 2 = bad input file, 3 = inconsistent reference data,
    /// 4 = output could not be written, 1 = everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::FileNotFound { .. }
            | AppError::UnreadableFile { .. }
            | AppError::InvalidJson { .. }
            | AppError::SchemaViolation { .. } => 2,

            AppError::InvalidReferenceData { .. }
            | AppError::MissingMinimumWage { .. }
            | AppError::DuplicateCity { .. } => 3,

            AppError::WriteFailed { .. } => 4,

            AppError::Configuration { .. } | AppError::Serialization(_) => 1,
        }
    }

    /// Log this error with its code before the process exits
    pub fn report(&self) {
        if let AppError::SchemaViolation { path, violations } = self {
            for violation in violations {
                tracing::error!(
                    path = %path.display(),
                    location = %violation.location,
                    "{}",
                    violation.message
                );
            }
        }
        tracing::error!(
            error = %self,
            code = ?self.code(),
            numeric_code = self.code().as_code(),
            "Run aborted"
        );
    }

    pub fn unreadable(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            AppError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            AppError::UnreadableFile {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}
