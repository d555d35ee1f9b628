//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// A native OS file system implementation.
///
/// This wraps `std::fs` operations and provides the `VirtualFileSystem`
/// interface for local file access.
#[derive(Debug, Clone, Default)]
pub struct NativeFileSystem;

impl NativeFileSystem {
    /// Create a new native file system.
    pub fn new() -> Self {
        Self
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        if path.is_dir() {
            return Err(VfsError::IsDirectory {
                path: path.to_string_lossy().to_string(),
            });
        }
        std::fs::read(path).map_err(|e| VfsError::from_io(e, path))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        std::fs::write(path, content).map_err(|e| VfsError::from_io(e, path))
    }

    fn append_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        // The handle is dropped (closed) on both the Ok and Err paths.
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| VfsError::from_io(e, path))?;
        file.write_all(content)
            .and_then(|_| file.flush())
            .map_err(|e| VfsError::from_io(e, path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_read_write() {
        let dir = tempfile::tempdir().unwrap();
        let fs = NativeFileSystem::new();
        let path = dir.path().join("rw.sn");

        fs.write_file(&path, b"hello native").unwrap();
        assert_eq!(fs.read_file(&path).unwrap(), b"hello native");
    }

    #[test]
    fn test_native_append() {
        let dir = tempfile::tempdir().unwrap();
        let fs = NativeFileSystem::new();
        let path = dir.path().join("caught.log");

        fs.append_file(&path, b"one\n").unwrap();
        fs.append_file(&path, b"two\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_native_is_file_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        let fs = NativeFileSystem::new();
        let file = dir.path().join("mod.sn");
        std::fs::write(&file, "pass;").unwrap();

        assert!(fs.is_file(&file));
        assert!(!fs.is_dir(&file));
        assert!(fs.is_dir(dir.path()));
        assert!(!fs.is_file(dir.path()));
        assert!(matches!(
            fs.read_file(dir.path()),
            Err(VfsError::IsDirectory { .. })
        ));
    }

    #[test]
    fn test_native_read_nonexistent() {
        let dir = tempfile::tempdir().unwrap();
        let fs = NativeFileSystem::new();
        let missing = dir.path().join("missing.sn");

        assert!(!fs.exists(&missing));
        assert!(matches!(
            fs.read_file(&missing),
            Err(VfsError::NotFound { .. })
        ));
    }

    #[test]
    fn test_native_append_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let fs = NativeFileSystem::new();
        let path = dir.path().join("no/such/dir/log");
        assert!(fs.append_file(&path, b"x").is_err());
    }
}
