//! Error types and exit codes for smartplate

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Main error type for smartplate operations
#[derive(Error, Debug)]
pub enum SmartplateError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error at {}: {message}", path.display())]
    IoError { path: PathBuf, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] LookupError),

    #[error("Seed import failed: {message}")]
    SeedError { message: String },

    #[error("Server error: {message}")]
    ServerError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SmartplateError {
    /// Convert error to the process exit code:
    /// - 1: IO error
    /// - 2: Configuration error
    /// - 3: Storage error
    /// - 4: Seed import failure
    /// - 5: Server failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::IoError { .. } | Self::Io(_) => ExitCode::from(1),
            Self::ConfigError { .. } => ExitCode::from(2),
            Self::Storage(_) => ExitCode::from(3),
            Self::SeedError { .. } => ExitCode::from(4),
            Self::ServerError { .. } => ExitCode::from(5),
        }
    }
}

/// Result type alias for smartplate operations
pub type Result<T> = std::result::Result<T, SmartplateError>;

/// Kind of a failed collaborator lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupErrorKind {
    NotFound,
    Conflict,
    Transient,
    Unknown,
}

/// Failure reported by a record lookup.
///
/// Absence is normally `Ok(None)`; `NotFound` exists for stores that can only
/// signal absence as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} lookup is ambiguous: {message}")]
    Conflict {
        entity: &'static str,
        message: String,
    },

    #[error("transient storage failure: {message}")]
    Transient { message: String },

    #[error("storage failure: {message}")]
    Unknown { message: String },
}

impl LookupError {
    pub fn kind(&self) -> LookupErrorKind {
        match self {
            Self::NotFound { .. } => LookupErrorKind::NotFound,
            Self::Conflict { .. } => LookupErrorKind::Conflict,
            Self::Transient { .. } => LookupErrorKind::Transient,
            Self::Unknown { .. } => LookupErrorKind::Unknown,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == LookupErrorKind::NotFound
    }
}

impl From<rusqlite::Error> for LookupError {
    fn from(e: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => Self::Transient {
                message: e.to_string(),
            },
            _ => Self::Unknown {
                message: e.to_string(),
            },
        }
    }
}
