use crate::analyzer::plan::PlanError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IacExplainError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Operation '{0}' is not supported")]
    Unsupported(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration parsing failed: {0}")]
    ParsingFailed(String),

    #[error("Unknown policy set: {0}")]
    UnknownPolicySet(String),
}

pub type Result<T> = std::result::Result<T, IacExplainError>;
