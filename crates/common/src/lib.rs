//! Poutine Index Common Library
//!
//! Shared code for the pipeline binaries including:
//! - Record and document models
//! - Reference data loading
//! - Document-level schema checks
//! - JSON file I/O
//! - Error types and handling
//! - Configuration management
//! - Tracing setup

pub mod config;
pub mod errors;
pub mod files;
pub mod models;
pub mod reference;
pub mod schema;
pub mod telemetry;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use reference::ReferenceData;
pub use schema::{SchemaKind, SchemaSet};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
