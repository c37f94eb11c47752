//! src/error.rs
//! ============================================================================
//! # `ExplorerError`: Unified Error Type for the Explorer Core
//!
//! Every fallible operation in the crate returns `ExplorerResult<T>`. Batch
//! operations never stop on the first error: they collect one `ExplorerError`
//! per failed item into a [`crate::operators::reconciler::BatchReport`].

use std::io;
use thiserror::Error;

pub type ExplorerResult<T> = Result<T, ExplorerError>;

/// Unified error type for explorer operations.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// Destination path is already occupied.
    #[error("\"{path}\" already exists at destination")]
    NameConflict { path: String },

    /// A folder was moved into itself or one of its descendants.
    #[error("Cannot move folder \"{source_path}\" into itself or its children (target: \"{target}\")")]
    SelfContainment { source_path: String, target: String },

    /// Underlying storage operation failed.
    #[error("Storage operation '{operation}' failed on \"{path}\": {source}")]
    Io {
        operation: &'static str, // "rename", "create_file", "delete", ...
        path: String,
        #[source]
        source: io::Error,
    },

    /// Requested item does not exist in the tree.
    #[error("Item not found: \"{0}\"")]
    NotFound(String),

    /// Item names must be non-empty and contain no path separator.
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// Operation requires a folder but the path names a file.
    #[error("Not a folder: \"{0}\"")]
    NotAFolder(String),

    /// Settings (de)serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML config parsing error.
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Plain IO error without path context.
    #[error("I/O error: {0}")]
    StdIo(#[from] io::Error),
}

impl ExplorerError {
    /// Create a name conflict error
    pub fn name_conflict<S: Into<String>>(path: S) -> Self {
        Self::NameConflict { path: path.into() }
    }

    /// Create a self-containment error
    pub fn self_containment<S1: Into<String>, S2: Into<String>>(source: S1, target: S2) -> Self {
        Self::SelfContainment {
            source_path: source.into(),
            target: target.into(),
        }
    }

    /// Wrap an `io::Error` with the operation and path it failed on
    pub fn io<S: Into<String>>(operation: &'static str, path: S, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Per-item failures a batch can skip over and keep going.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NameConflict { .. }
                | Self::SelfContainment { .. }
                | Self::Io { .. }
                | Self::NotFound(_)
                | Self::InvalidName(_)
                | Self::NotAFolder(_)
        )
    }
}

// Manual Clone implementation to handle non-Clone fields
impl Clone for ExplorerError {
    fn clone(&self) -> Self {
        match self {
            Self::NameConflict { path } => Self::NameConflict { path: path.clone() },
            Self::SelfContainment {
                source_path,
                target,
            } => Self::SelfContainment {
                source_path: source_path.clone(),
                target: target.clone(),
            },
            Self::Io {
                operation,
                path,
                source,
            } => Self::Io {
                operation: *operation,
                path: path.clone(),
                source: io::Error::new(source.kind(), source.to_string()),
            },
            Self::NotFound(path) => Self::NotFound(path.clone()),
            Self::InvalidName(name) => Self::InvalidName(name.clone()),
            Self::NotAFolder(path) => Self::NotAFolder(path.clone()),
            Self::Serde(e) => Self::StdIo(io::Error::new(io::ErrorKind::InvalidData, e.to_string())),
            Self::Config(e) => Self::StdIo(io::Error::new(io::ErrorKind::InvalidData, e.to_string())),
            Self::StdIo(e) => Self::StdIo(io::Error::new(e.kind(), e.to_string())),
        }
    }
}
