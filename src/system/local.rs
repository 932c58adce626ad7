//! Local filesystem implementation of StoreSystem
//!
//! Serves both local disks and network shares mounted into the filesystem;
//! the reconciler never needs to know which one it is talking to.

use modelvault_core_interface::{FileMetadata, Result, StoreSystem, StoreSystemError, Walk};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

/// Local filesystem implementation of StoreSystem
///
/// # Example
///
/// ```rust,no_run
/// use modelvault::system::LocalSystem;
/// use modelvault_core_interface::StoreSystem;
/// use std::path::Path;
///
/// let system = LocalSystem::new();
/// let meta = system.metadata(Path::new("/home/me/.ollama/models")).unwrap();
/// println!("Store is a directory: {}", meta.is_dir);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LocalSystem;

impl LocalSystem {
    /// Create a new LocalSystem instance
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn to_metadata(path: &Path, meta: &fs::Metadata) -> FileMetadata {
    FileMetadata {
        path: path.to_path_buf(),
        len: if meta.is_dir() { 0 } else { meta.len() },
        is_dir: meta.is_dir(),
        modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        link_error: None,
    }
}

fn walk_error(path: &Path, err: walkdir::Error) -> StoreSystemError {
    match err.into_io_error() {
        Some(io) => StoreSystemError::from_io(path, io),
        None => StoreSystemError::System(format!("filesystem loop at {}", path.display())),
    }
}

impl StoreSystem for LocalSystem {
    fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let meta = fs::metadata(path).map_err(|e| StoreSystemError::from_io(path, e))?;
        Ok(to_metadata(path, &meta))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<FileMetadata>> {
        let dir = fs::read_dir(path).map_err(|e| {
            if path.is_file() {
                StoreSystemError::NotADirectory(path.to_path_buf())
            } else {
                StoreSystemError::from_io(path, e)
            }
        })?;

        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| StoreSystemError::from_io(path, e))?;
            let entry_path = entry.path();
            // Follow symlinks: blob stores on shares are often symlinked in
            match fs::metadata(&entry_path) {
                Ok(meta) => entries.push(to_metadata(&entry_path, &meta)),
                Err(e) => match fs::symlink_metadata(&entry_path) {
                    Err(gone) if gone.kind() == std::io::ErrorKind::NotFound => {
                        debug!("{} vanished while listing", entry_path.display());
                    }
                    _ => {
                        debug!("Unresolved entry {}: {}", entry_path.display(), e);
                        entries.push(FileMetadata::unresolved_link(entry_path, e.to_string()));
                    }
                },
            }
        }

        Ok(entries)
    }

    fn reader(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let file = fs::File::open(path).map_err(|e| StoreSystemError::from_io(path, e))?;
        Ok(Box::new(file))
    }

    /// Follows links. Dangling links, loops and unreadable subdirectories
    /// become failures; only the starting directory can fail the walk.
    fn walk_files(&self, path: &Path) -> Result<Walk> {
        let mut walk = Walk::default();
        for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let failed = e.path().unwrap_or(path).to_path_buf();
                    let depth = e.depth();
                    let error = walk_error(&failed, e);
                    if depth == 0 {
                        return Err(error);
                    }
                    walk.record_failure(failed, error);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match entry.metadata() {
                Ok(meta) => walk.files.push(to_metadata(entry.path(), &meta)),
                Err(e) => {
                    let failed = entry.path().to_path_buf();
                    let error = walk_error(&failed, e);
                    walk.record_failure(failed, error);
                }
            }
        }
        Ok(walk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelvault_core_interface::StoreSystemExt;
    use tempfile::tempdir;

    #[test]
    fn test_metadata() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("test.txt");
        fs::write(&file, b"hello world").unwrap();

        let system = LocalSystem::new();
        let meta = system.metadata(&file).unwrap();
        assert_eq!(meta.len, 11);
        assert!(!meta.is_dir);

        let dir_meta = system.metadata(dir.path()).unwrap();
        assert!(dir_meta.is_dir);
        assert_eq!(dir_meta.len, 0);
    }

    #[test]
    fn test_metadata_not_found() {
        let system = LocalSystem::new();
        let err = system
            .metadata(Path::new("/nonexistent/modelvault/file"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_read_dir() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a"), b"1").unwrap();
        fs::write(dir.path().join("b"), b"22").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let system = LocalSystem::new();
        let entries = system.read_dir(dir.path()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.iter().filter(|e| e.is_dir).count(), 1);
    }

    #[test]
    fn test_read_dir_on_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();

        let err = LocalSystem::new().read_dir(&file).unwrap_err();
        assert!(matches!(err, StoreSystemError::NotADirectory(_)));
    }

    #[test]
    fn test_walk_files_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x/y")).unwrap();
        fs::write(dir.path().join("x/y/z"), b"deep").unwrap();
        fs::write(dir.path().join("b"), b"top").unwrap();

        let walk = LocalSystem::new().walk_files(dir.path()).unwrap();
        let lens: Vec<u64> = walk.files.iter().map(|f| f.len).collect();
        assert_eq!(walk.files.len(), 2);
        assert_eq!(lens, vec![3, 4]);
        assert!(walk.failures.is_empty());
    }

    #[test]
    fn test_walk_missing_root_is_not_found() {
        let dir = tempdir().unwrap();
        let err = LocalSystem::new()
            .walk_files(&dir.path().join("manifests"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_keeps_going_past_dangling_link() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("llama3")).unwrap();
        fs::write(dir.path().join("llama3/latest"), b"{}").unwrap();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("llama3/old"))
            .unwrap();

        let walk = LocalSystem::new().walk_files(dir.path()).unwrap();
        assert_eq!(walk.files.len(), 1);
        assert_eq!(walk.files[0].file_name(), Some("latest"));
        assert_eq!(walk.failures.len(), 1);
        assert_eq!(walk.failures[0].path, dir.path().join("llama3/old"));
        assert!(walk.failures[0].error.is_not_found());
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_follows_linked_file() {
        let dir = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        fs::write(elsewhere.path().join("target"), b"linked").unwrap();
        std::os::unix::fs::symlink(elsewhere.path().join("target"), dir.path().join("tag"))
            .unwrap();

        let walk = LocalSystem::new().walk_files(dir.path()).unwrap();
        assert_eq!(walk.files.len(), 1);
        assert_eq!(walk.files[0].len, 6);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_dir_lists_dangling_link() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("real"), b"1").unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("stale")).unwrap();

        let entries = LocalSystem::new().read_dir(dir.path()).unwrap();
        assert_eq!(entries.len(), 2);
        let stale = entries
            .iter()
            .find(|e| e.file_name() == Some("stale"))
            .unwrap();
        assert!(stale.link_error.is_some());
        assert!(!stale.is_dir);
    }

    #[test]
    fn test_read_all() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("manifest");
        fs::write(&file, br#"{"layers":[]}"#).unwrap();

        let data = LocalSystem::new().read_all(&file).unwrap();
        assert_eq!(data, br#"{"layers":[]}"#);
    }
}
