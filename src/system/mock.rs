//! Mock filesystem implementation for testing
//!
//! In-memory StoreSystem that can also simulate a share refusing access to
//! individual paths, which a real temp directory cannot do portably.

use modelvault_core_interface::{FileMetadata, Result, StoreSystem, StoreSystemError};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

/// In-memory file data
#[derive(Debug, Clone)]
struct MockFile {
    data: Vec<u8>,
    modified: SystemTime,
    is_dir: bool,
    dangling: bool,
}

/// Mock filesystem implementation for testing
///
/// Parent directories are created implicitly by `add_file`.
#[derive(Debug, Clone, Default)]
pub struct MockSystem {
    files: Arc<RwLock<HashMap<PathBuf, MockFile>>>,
    denied: Arc<RwLock<HashSet<PathBuf>>>,
}

impl MockSystem {
    /// Create a new empty mock filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given content
    pub fn add_file(&self, path: impl Into<PathBuf>, data: &[u8]) {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        let file = MockFile {
            data: data.to_vec(),
            modified: SystemTime::now(),
            is_dir: false,
            dangling: false,
        };
        self.files.write().unwrap().insert(path, file);
    }

    /// Add a link whose target does not exist
    pub fn add_dangling_link(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        let link = MockFile {
            data: Vec::new(),
            modified: SystemTime::now(),
            is_dir: false,
            dangling: true,
        };
        self.files.write().unwrap().insert(path, link);
    }

    /// Add a directory and all of its ancestors
    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut files = self.files.write().unwrap();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            files.entry(ancestor.to_path_buf()).or_insert(MockFile {
                data: Vec::new(),
                modified: SystemTime::now(),
                is_dir: true,
                dangling: false,
            });
        }
    }

    /// Make every access to `path` fail with PermissionDenied
    pub fn deny(&self, path: impl Into<PathBuf>) {
        self.denied.write().unwrap().insert(path.into());
    }

    /// Remove a file or directory
    pub fn remove(&self, path: &Path) {
        self.files.write().unwrap().remove(path);
    }

    fn check_access(&self, path: &Path) -> Result<()> {
        if self.denied.read().unwrap().contains(path) {
            return Err(StoreSystemError::PermissionDenied(path.to_path_buf()));
        }
        Ok(())
    }

    fn to_metadata(path: &Path, file: &MockFile) -> FileMetadata {
        if file.dangling {
            return FileMetadata::unresolved_link(path, "link target not found");
        }
        FileMetadata {
            path: path.to_path_buf(),
            len: if file.is_dir { 0 } else { file.data.len() as u64 },
            is_dir: file.is_dir,
            modified: file.modified,
            link_error: None,
        }
    }

    /// Look up `path` the way following a link would
    fn resolve<'a>(
        files: &'a HashMap<PathBuf, MockFile>,
        path: &Path,
    ) -> Result<&'a MockFile> {
        files
            .get(path)
            .filter(|f| !f.dangling)
            .ok_or_else(|| StoreSystemError::NotFound(path.to_path_buf()))
    }
}

impl StoreSystem for MockSystem {
    fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        self.check_access(path)?;
        let files = self.files.read().unwrap();
        let file = Self::resolve(&files, path)?;
        Ok(Self::to_metadata(path, file))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<FileMetadata>> {
        self.check_access(path)?;
        let files = self.files.read().unwrap();

        if !Self::resolve(&files, path)?.is_dir {
            return Err(StoreSystemError::NotADirectory(path.to_path_buf()));
        }

        let mut entries: Vec<FileMetadata> = files
            .iter()
            .filter(|(file_path, _)| file_path.parent() == Some(path))
            .map(|(file_path, file)| Self::to_metadata(file_path, file))
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn reader(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        self.check_access(path)?;
        let files = self.files.read().unwrap();
        let file = Self::resolve(&files, path)?;
        Ok(Box::new(Cursor::new(file.data.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelvault_core_interface::StoreSystemExt;

    #[test]
    fn test_add_file_creates_parents() {
        let system = MockSystem::new();
        system.add_file("/store/blobs/sha256-aa", b"abc");

        assert!(system.metadata(Path::new("/store")).unwrap().is_dir);
        assert!(system.metadata(Path::new("/store/blobs")).unwrap().is_dir);
        assert_eq!(
            system.metadata(Path::new("/store/blobs/sha256-aa")).unwrap().len,
            3
        );
    }

    #[test]
    fn test_read_dir_direct_children_only() {
        let system = MockSystem::new();
        system.add_file("/store/a", b"1");
        system.add_file("/store/sub/b", b"2");

        let entries = system.read_dir(Path::new("/store")).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_denied_path() {
        let system = MockSystem::new();
        system.add_file("/store/blobs/x", b"1");
        system.deny("/store/blobs/x");

        let err = system.metadata(Path::new("/store/blobs/x")).unwrap_err();
        assert!(matches!(err, StoreSystemError::PermissionDenied(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_read_all_and_remove() {
        let system = MockSystem::new();
        system.add_file("/m", b"data");
        assert_eq!(system.read_all(Path::new("/m")).unwrap(), b"data");

        system.remove(Path::new("/m"));
        assert!(system.metadata(Path::new("/m")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_dangling_link() {
        let system = MockSystem::new();
        system.add_dangling_link("/store/blobs/sha256-bb");

        let link = Path::new("/store/blobs/sha256-bb");
        assert!(system.metadata(link).unwrap_err().is_not_found());
        assert!(system.reader(link).is_err());

        let entries = system.read_dir(Path::new("/store/blobs")).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].link_error.is_some());
    }
}
