use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of a failure.
///
/// Callers use this to decide how a failed step propagates: input and
/// prerequisite errors abort before any mutation, validation failures
/// trigger a manifest restore, and process failures are fatal or advisory
/// depending on the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Prerequisite,
    Process,
    Validation,
    Io,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upsert rejected: key must not be empty")]
    EmptyKey,

    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("Failed to run '{command}': {source}")]
    ProcessSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with status {code}: {stderr}")]
    ProcessFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Manifest validation failed: {0}")]
    ManifestInvalid(String),

    #[error("Failed to parse environment file {path}: {source}")]
    EnvFileParse {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Failed to render manifest: {0}")]
    ManifestRender(#[from] serde_yaml::Error),

    #[error("Service stop failed, refusing to start: {0}")]
    StopFailed(String),

    #[error("Admin endpoint request failed: {0}")]
    Admin(#[from] reqwest::Error),

    #[error("Admin endpoint returned HTTP {status}")]
    AdminStatus { status: u16 },

    #[error("Failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Classify this error for fatal-vs-advisory decisions at call sites.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidInput(_) | CoreError::EmptyKey => ErrorKind::Input,
            CoreError::MissingPrerequisite(_) => ErrorKind::Prerequisite,
            CoreError::ProcessSpawn { .. }
            | CoreError::ProcessFailed { .. }
            | CoreError::StopFailed(_)
            | CoreError::Admin(_)
            | CoreError::AdminStatus { .. } => ErrorKind::Process,
            CoreError::ManifestInvalid(_)
            | CoreError::ManifestRender(_)
            | CoreError::EnvFileParse { .. } => ErrorKind::Validation,
            CoreError::ReadFile { .. } | CoreError::WriteFile { .. } | CoreError::Io(_) => {
                ErrorKind::Io
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
