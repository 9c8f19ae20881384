//! Error types for rego-core

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::ComponentKind;

/// Result type alias using rego-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the snapshot engine and its component adapters
#[derive(Error, Debug)]
pub enum Error {
    /// A required tool or path is missing on this host
    #[error("{kind} is unavailable: {reason}")]
    Unavailable { kind: ComponentKind, reason: String },

    /// Querying the live system state failed
    #[error("Failed to probe installed {kind}: {message}")]
    ProbeFailure { kind: ComponentKind, message: String },

    /// An adapter ran but could not capture its state
    #[error("Failed to capture {kind}: {message}")]
    CaptureFailure { kind: ComponentKind, message: String },

    /// An adapter ran but could not apply its state
    #[error("Failed to restore {kind}: {message}")]
    ApplyFailure { kind: ComponentKind, message: String },

    /// Missing, corrupt or unsupported manifest
    #[error("Invalid manifest at {path}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    /// Malformed archive or an entry escaping the destination
    #[error("Archive integrity failure: {message}")]
    ArchiveIntegrity { message: String },

    /// The snapshot target directory could not be created
    #[error("Cannot create target directory {path}: {source}")]
    TargetDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External command exceeded its time budget
    #[error("Command '{program}' timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    /// External command exited unsuccessfully
    #[error("Command '{program}' failed with exit code {code:?}: {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The run was cancelled between component steps
    #[error("Operation cancelled")]
    Cancelled,

    /// The snapshot directory lock could not be taken
    #[error("Failed to lock {path}: {message}")]
    Locked { path: PathBuf, message: String },

    /// Invalid settings
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Directory traversal error
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    /// Create an unavailable error
    pub fn unavailable(kind: ComponentKind, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            kind,
            reason: reason.into(),
        }
    }

    /// Create a probe failure
    pub fn probe(kind: ComponentKind, message: impl Into<String>) -> Self {
        Self::ProbeFailure {
            kind,
            message: message.into(),
        }
    }

    /// Create a capture failure
    pub fn capture(kind: ComponentKind, message: impl Into<String>) -> Self {
        Self::CaptureFailure {
            kind,
            message: message.into(),
        }
    }

    /// Create an apply failure
    pub fn apply(kind: ComponentKind, message: impl Into<String>) -> Self {
        Self::ApplyFailure {
            kind,
            message: message.into(),
        }
    }

    /// Create a manifest invalid error
    pub fn manifest_invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ManifestInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an archive integrity error
    pub fn archive(message: impl Into<String>) -> Self {
        Self::ArchiveIntegrity {
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error is a command timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
