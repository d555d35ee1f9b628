//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// An in-memory file system implementation.
///
/// All files are stored in memory using a `BTreeMap`. Directories are not
/// stored; a path is a directory when some file lives below it.
///
/// # Example
/// ```
/// use snitch_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/app/main.sn"), b"pass;").unwrap();
/// assert!(fs.is_dir(Path::new("/app")));
/// assert_eq!(fs.read_file(Path::new("/app/main.sn")).unwrap(), b"pass;");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Create a new memory file system pre-populated with files.
    pub fn with_files<I, S, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, C)>,
        S: AsRef<str>,
        C: Into<Vec<u8>>,
    {
        let map = files
            .into_iter()
            .map(|(path, content)| (normalize(Path::new(path.as_ref())), content.into()))
            .collect();
        Self {
            files: Arc::new(RwLock::new(map)),
        }
    }

    /// Read a file as UTF-8 text, mostly useful in tests.
    pub fn read_to_string(&self, path: &Path) -> VfsResult<String> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes).map_err(|e| VfsError::Custom {
            message: e.to_string(),
        })
    }

    fn read_guard(&self) -> VfsResult<RwLockReadGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.files.read().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })
    }

    fn write_guard(&self) -> VfsResult<RwLockWriteGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.files.write().map_err(|_| VfsError::Custom {
            message: String::from("Lock poisoned"),
        })
    }

    fn check_not_dir(&self, normalized: &str) -> VfsResult<()> {
        if self.is_dir(Path::new(normalized)) {
            return Err(VfsError::IsDirectory {
                path: normalized.to_string(),
            });
        }
        Ok(())
    }
}

/// Normalize a path string for internal storage.
/// Uses forward slashes and drops a trailing separator.
fn normalize(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    match s.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => s,
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = normalize(path);
        self.check_not_dir(&normalized)?;
        let files = self.read_guard()?;

        files
            .get(&normalized)
            .cloned()
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let normalized = normalize(path);
        self.check_not_dir(&normalized)?;
        let mut files = self.write_guard()?;
        files.insert(normalized, content.to_vec());
        Ok(())
    }

    fn append_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let normalized = normalize(path);
        self.check_not_dir(&normalized)?;
        let mut files = self.write_guard()?;
        files
            .entry(normalized)
            .or_default()
            .extend_from_slice(content);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let normalized = normalize(path);
        match self.files.read() {
            Ok(files) => files.contains_key(&normalized),
            Err(_) => false,
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        let mut prefix = normalize(path);
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        match self.files.read() {
            Ok(files) => files
                .range(prefix.clone()..)
                .next()
                .is_some_and(|(key, _)| key.starts_with(&prefix)),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_fs_is_empty() {
        let fs = MemoryFileSystem::new();
        assert!(!fs.exists(Path::new("/anything.sn")));
    }

    #[test]
    fn test_write_and_read() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/test.sn");

        fs.write_file(path, b"var x = 1;").unwrap();
        assert_eq!(fs.read_file(path).unwrap(), b"var x = 1;");
    }

    #[test]
    fn test_append_creates_then_extends() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/logs/caught.log");

        fs.append_file(path, b"first\n").unwrap();
        fs.append_file(path, b"second\n").unwrap();

        assert_eq!(fs.read_to_string(path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_directories_are_inferred() {
        let fs = MemoryFileSystem::with_files([
            ("/app/backend/__init__.sn", ""),
            ("/app/backend/api.sn", "pass;"),
        ]);

        assert!(fs.is_dir(Path::new("/")));
        assert!(fs.is_dir(Path::new("/app")));
        assert!(fs.is_dir(Path::new("/app/backend/")));
        assert!(!fs.is_dir(Path::new("/app/backend/api.sn")));
        assert!(!fs.is_dir(Path::new("/app/back")));
        assert!(fs.exists(Path::new("/app/backend")));
        assert!(!fs.is_file(Path::new("/app/backend")));
    }

    #[test]
    fn test_directory_is_not_readable() {
        let fs = MemoryFileSystem::with_files([("/pkg/mod.sn", "pass;")]);
        let result = fs.read_file(Path::new("/pkg"));
        assert!(matches!(result, Err(VfsError::IsDirectory { .. })));
        assert!(fs.append_file(Path::new("/pkg"), b"x").is_err());
    }

    #[test]
    fn test_read_nonexistent() {
        let fs = MemoryFileSystem::new();
        let result = fs.read_file(Path::new("/nonexistent.sn"));
        assert!(matches!(result.unwrap_err(), VfsError::NotFound { .. }));
    }

    #[test]
    fn test_overwrite_file() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/overwrite.txt");

        fs.write_file(path, b"first").unwrap();
        fs.write_file(path, b"second").unwrap();

        assert_eq!(fs.read_file(path).unwrap(), b"second");
    }

    #[test]
    fn test_backslashes_normalized() {
        let fs = MemoryFileSystem::new();
        fs.write_file(Path::new("\\win\\mod.sn"), b"pass;").unwrap();
        assert!(fs.is_file(Path::new("/win/mod.sn")));
    }

    #[test]
    fn test_clone_shares_data() {
        let fs1 = MemoryFileSystem::new();
        let path = Path::new("/shared.txt");
        fs1.write_file(path, b"shared").unwrap();

        let fs2 = fs1.clone();
        fs2.append_file(path, b"!").unwrap();
        assert_eq!(fs1.read_file(path).unwrap(), b"shared!");
    }

    #[test]
    fn test_concurrent_appends() {
        let fs = MemoryFileSystem::new();
        let mut handles = vec![];

        for _ in 0..8 {
            let fs_clone = fs.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..25 {
                    fs_clone.append_file(Path::new("/log"), b"x").unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(fs.read_file(Path::new("/log")).unwrap().len(), 200);
    }
}
