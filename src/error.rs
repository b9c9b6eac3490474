//! Fatal-for-run errors
//!
//! Per-file and per-collector failures are swallowed (and logged) inside the
//! collectors. Only a primary input that cannot be interpreted at all ends up
//! here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Repository root not found or not a directory: {0}")]
    MissingRoot(PathBuf),

    #[error("Invalid floor plan: {0}")]
    InvalidFloorPlan(String),

    #[error("Failed to parse floor plan JSON: {0}")]
    FloorPlanParse(#[from] serde_json::Error),

    #[error("Invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Invalid ignore pattern '{pattern}': {message}")]
    InvalidIgnorePattern { pattern: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AuditResult<T> = Result<T, AuditError>;
