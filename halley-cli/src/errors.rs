use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Required value for '{0}' was empty")]
    EmptyInput(String),

    #[error("Invalid --set argument '{0}': expected KEY=VALUE")]
    InvalidSetPair(String),

    #[error("Unknown schema version '{0}' (expected v1 or v2)")]
    UnknownSchema(String),

    #[error("Node is not installed at {0} (run 'halley install' first)")]
    NotInstalled(PathBuf),

    #[error("Aborted by operator")]
    Aborted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] halley_core::errors::CoreError),
}

pub type Result<T> = std::result::Result<T, CliError>;
