/*!
 * Error types for modelvault
 */

use modelvault_core_interface::StoreSystemError;
use modelvault_core_manifest::Error as ManifestError;
use std::fmt;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, VaultError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;
pub const EXIT_INTEGRITY: i32 = 3;

#[derive(Debug)]
pub enum VaultError {
    /// Store root missing, unreadable or not a directory
    StoreRootUnavailable { path: PathBuf, reason: String },

    /// Per-file I/O failure other than not-found
    IoFailure {
        path: PathBuf,
        source: StoreSystemError,
    },

    /// Manifest could not be parsed
    Manifest(ManifestError),

    /// Configuration error
    Config(String),

    /// Requested model has no manifest in the store
    ModelNotFound(String),

    /// Background worker stopped or disconnected
    Worker(String),
}

impl VaultError {
    /// Store root failure from the underlying system error
    pub fn store_unavailable(path: &Path, err: &StoreSystemError) -> Self {
        VaultError::StoreRootUnavailable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            VaultError::StoreRootUnavailable { .. }
            | VaultError::Manifest(_)
            | VaultError::Config(_)
            | VaultError::ModelNotFound(_) => EXIT_FATAL,
            VaultError::IoFailure { .. } | VaultError::Worker(_) => EXIT_PARTIAL,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            VaultError::StoreRootUnavailable { .. } => ErrorCategory::Store,
            VaultError::IoFailure { .. } => ErrorCategory::IoError,
            VaultError::Manifest(_) => ErrorCategory::Manifest,
            VaultError::Config(_) => ErrorCategory::Configuration,
            VaultError::ModelNotFound(_) => ErrorCategory::Lookup,
            VaultError::Worker(_) => ErrorCategory::Concurrency,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Store root reachability
    Store,
    /// Per-file I/O
    IoError,
    /// Manifest shape or digest problems
    Manifest,
    /// Configuration errors
    Configuration,
    /// Model lookup
    Lookup,
    /// Worker thread errors
    Concurrency,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Store => write!(f, "store"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Manifest => write!(f, "manifest"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Lookup => write!(f, "lookup"),
            ErrorCategory::Concurrency => write!(f, "concurrency"),
        }
    }
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultError::StoreRootUnavailable { path, reason } => {
                write!(f, "Store root unavailable: {} ({})", path.display(), reason)
            }
            VaultError::IoFailure { path, source } => {
                write!(f, "I/O failure on {}: {}", path.display(), source)
            }
            VaultError::Manifest(err) => {
                write!(f, "{}", err)
            }
            VaultError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            VaultError::ModelNotFound(model) => {
                write!(f, "Model not found: {}", model)
            }
            VaultError::Worker(msg) => {
                write!(f, "Reconcile worker error: {}", msg)
            }
        }
    }
}

impl std::error::Error for VaultError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VaultError::IoFailure { source, .. } => Some(source),
            VaultError::Manifest(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ManifestError> for VaultError {
    fn from(err: ManifestError) -> Self {
        VaultError::Manifest(err)
    }
}

impl From<crate::config::ConfigError> for VaultError {
    fn from(err: crate::config::ConfigError) -> Self {
        VaultError::Config(err.to_string())
    }
}
