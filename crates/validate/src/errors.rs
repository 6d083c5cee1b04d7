//! Validator error types

use poutine_common::errors::AppError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("Raw price file not found: {} (run the price extraction first)", .path.display())]
    MissingInput { path: PathBuf },

    #[error(transparent)]
    App(#[from] AppError),
}

impl ValidateError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ValidateError::MissingInput { .. } => 2,
            ValidateError::App(e) => e.exit_code(),
        }
    }

    pub fn report(&self) {
        match self {
            ValidateError::App(e) => e.report(),
            other => tracing::error!(error = %other, "Run aborted"),
        }
    }
}
