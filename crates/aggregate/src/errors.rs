//! Aggregator error types

use poutine_common::errors::{AppError, SchemaViolation};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Validated price file not found: {} (run the validator first)", .path.display())]
    NoValidatedInput { path: PathBuf },

    #[error("Aggregate output breaks its own schema ({} violations)", .violations.len())]
    OutputContract { violations: Vec<SchemaViolation> },

    #[error(transparent)]
    App(#[from] AppError),
}

impl AggregateError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AggregateError::NoValidatedInput { .. } => 2,
            AggregateError::OutputContract { .. } => 1,
            AggregateError::App(e) => e.exit_code(),
        }
    }

    pub fn report(&self) {
        match self {
            AggregateError::App(e) => e.report(),
            AggregateError::OutputContract { violations } => {
                for violation in violations {
                    tracing::error!(location = %violation.location, "{}", violation.message);
                }
                tracing::error!(error = %self, "Run aborted");
            }
            other => tracing::error!(error = %other, "Run aborted"),
        }
    }
}
