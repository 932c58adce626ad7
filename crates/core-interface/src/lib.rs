//! modelvault Core Interface: store I/O abstraction
//!
//! This crate defines the `StoreSystem` trait, which hides where a model store
//! lives. A local disk and a network share mounted into the filesystem look the
//! same to the resolver and reconciler: both are reached through paths.
//!
//! # Architecture
//!
//! The `StoreSystem` trait provides two categories of operations:
//!
//! 1. **Discovery**: metadata and directory listings
//! 2. **Data Access**: streaming reads, with whole-file helpers on `StoreSystemExt`
//!
//! # Example
//!
//! ```rust,no_run
//! use modelvault_core_interface::StoreSystem;
//! use std::path::Path;
//!
//! fn blob_size<S: StoreSystem>(system: &S, path: &Path) -> Option<u64> {
//!     system.metadata(path).ok().map(|meta| meta.len)
//! }
//! ```
//!
//! All operations are synchronous. A reconciliation pass is a short sequence
//! of stat and listing calls and runs on a single thread.

use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreSystemError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Unresolved link {0}: {1}")]
    UnresolvedLink(PathBuf, String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("System error: {0}")]
    System(String),
}

impl StoreSystemError {
    /// Classify an I/O error for `path`
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StoreSystemError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => {
                StoreSystemError::PermissionDenied(path.to_path_buf())
            }
            _ => StoreSystemError::Io(err),
        }
    }

    /// True only for a confirmed absence, never for "could not check"
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreSystemError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreSystemError>;

/// Metadata for a file or directory in a store
///
/// Intentionally minimal so it can be produced by local disks, mounted
/// shares and in-memory test systems alike.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Full path to the file/directory
    pub path: PathBuf,

    /// Size in bytes (0 for directories)
    pub len: u64,

    /// Whether this is a directory
    pub is_dir: bool,

    /// Last modification time
    pub modified: SystemTime,

    /// Set when the entry is a link whose target could not be reached
    pub link_error: Option<String>,
}

impl FileMetadata {
    /// Create metadata for a file
    pub fn file(path: impl Into<PathBuf>, len: u64, modified: SystemTime) -> Self {
        Self {
            path: path.into(),
            len,
            is_dir: false,
            modified,
            link_error: None,
        }
    }

    /// Create metadata for a directory
    pub fn directory(path: impl Into<PathBuf>, modified: SystemTime) -> Self {
        Self {
            path: path.into(),
            len: 0,
            is_dir: true,
            modified,
            link_error: None,
        }
    }

    /// A listed entry whose link target could not be stat'ed
    pub fn unresolved_link(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            len: 0,
            is_dir: false,
            modified: SystemTime::UNIX_EPOCH,
            link_error: Some(reason.into()),
        }
    }

    /// Final path component as UTF-8, if any
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// An entry below a walked directory that could not be listed or stat'ed
#[derive(Debug)]
pub struct WalkFailure {
    pub path: PathBuf,
    pub error: StoreSystemError,
}

/// Files found by [`StoreSystem::walk_files`]
///
/// Failures below the starting directory do not stop the walk.
#[derive(Debug, Default)]
pub struct Walk {
    pub files: Vec<FileMetadata>,
    pub failures: Vec<WalkFailure>,
}

impl Walk {
    fn sort(&mut self) {
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
        self.failures.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Note an entry that could not be listed or stat'ed
    pub fn record_failure(&mut self, path: PathBuf, error: StoreSystemError) {
        self.failures.push(WalkFailure { path, error });
    }
}

/// Read-only access to a model store
///
/// Implementations must be `Send + Sync + 'static` so a pass can run on a
/// background worker thread.
pub trait StoreSystem: Send + Sync + 'static {
    /// Get metadata for a file or directory
    ///
    /// # Errors
    ///
    /// Returns `StoreSystemError::NotFound` if the path doesn't exist.
    /// Returns `StoreSystemError::PermissionDenied` if access is denied.
    fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// List directory contents (non-recursive)
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing directory and `NotADirectory` when
    /// `path` is a file. Entries whose link target cannot be reached are
    /// listed with `link_error` set, never dropped.
    fn read_dir(&self, path: &Path) -> Result<Vec<FileMetadata>>;

    /// Open a file for streaming reads
    fn reader(&self, path: &Path) -> Result<Box<dyn Read + Send>>;

    /// Every file below `path`, sorted by path
    ///
    /// Only a failure to list `path` itself is an error. Subdirectories that
    /// cannot be listed and unresolved links end up in `Walk::failures`.
    /// Implementations with a faster native walk may override this.
    fn walk_files(&self, path: &Path) -> Result<Walk> {
        let mut walk = Walk::default();
        let mut pending = self.read_dir(path)?;
        while let Some(mut entry) = pending.pop() {
            if let Some(reason) = entry.link_error.take() {
                let error = StoreSystemError::UnresolvedLink(entry.path.clone(), reason);
                walk.record_failure(entry.path, error);
            } else if entry.is_dir {
                match self.read_dir(&entry.path) {
                    Ok(children) => pending.extend(children),
                    Err(error) => walk.record_failure(entry.path, error),
                }
            } else {
                walk.files.push(entry);
            }
        }
        walk.sort();
        Ok(walk)
    }
}

/// Convenience methods derived from the core trait
pub trait StoreSystemExt: StoreSystem {
    /// Read entire file contents into memory
    ///
    /// Only meant for small files such as manifests; blobs are streamed.
    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        let mut reader = self.reader(path)?;
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .map_err(|e| StoreSystemError::from_io(path, e))?;
        Ok(buffer)
    }

    /// SHA-256 of an entire file, streamed in 64 KiB chunks
    fn calculate_file_hash(&self, path: &Path) -> Result<[u8; 32]> {
        let mut reader = self.reader(path)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 64 * 1024];

        loop {
            let n = reader
                .read(&mut buffer)
                .map_err(|e| StoreSystemError::from_io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(hasher.finalize().into())
    }
}

impl<T: StoreSystem + ?Sized> StoreSystemExt for T {}
