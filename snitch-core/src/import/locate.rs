//! Mapping identifiers to files

use snitch_vfs::VirtualFileSystem;
use std::path::{Path, PathBuf};

pub const SOURCE_EXTENSION: &str = "sn";
pub const PACKAGE_INIT: &str = "__init__.sn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// `<dir>/<leaf>.sn`
    Source(PathBuf),
    /// `<dir>/<leaf>/`, with its `__init__.sn` if present.
    Package { dir: PathBuf, init: Option<PathBuf> },
}

impl Location {
    /// The file whose code runs as the module body.
    pub fn source(&self) -> Option<&Path> {
        match self {
            Location::Source(path) => Some(path),
            Location::Package { init, .. } => init.as_deref(),
        }
    }
}

/// First match over `dirs`; within one directory a package wins over a file.
pub fn locate<'a, I>(vfs: &dyn VirtualFileSystem, leaf: &str, dirs: I) -> Option<Location>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    for dir in dirs {
        let package = dir.join(leaf);
        if vfs.is_dir(&package) {
            let init = package.join(PACKAGE_INIT);
            let init = vfs.is_file(&init).then_some(init);
            return Some(Location::Package { dir: package, init });
        }
        let source = dir.join(format!("{leaf}.{SOURCE_EXTENSION}"));
        if vfs.is_file(&source) {
            return Some(Location::Source(source));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use snitch_vfs::MemoryFileSystem;

    fn fs() -> MemoryFileSystem {
        MemoryFileSystem::with_files([
            ("/a/util.sn", ""),
            ("/b/util.sn", ""),
            ("/b/pkg/__init__.sn", ""),
            ("/b/bare/mod.sn", ""),
            ("/c/pkg.sn", ""),
        ])
    }

    #[test]
    fn test_first_directory_wins() {
        let dirs = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        assert_eq!(
            locate(&fs(), "util", &dirs),
            Some(Location::Source(PathBuf::from("/a/util.sn")))
        );
    }

    #[test]
    fn test_package_with_and_without_init() {
        let dirs = vec![PathBuf::from("/b")];
        assert_eq!(
            locate(&fs(), "pkg", &dirs),
            Some(Location::Package {
                dir: PathBuf::from("/b/pkg"),
                init: Some(PathBuf::from("/b/pkg/__init__.sn")),
            })
        );
        let bare = locate(&fs(), "bare", &dirs);
        assert_eq!(bare.as_ref().and_then(Location::source), None);
    }

    #[test]
    fn test_missing() {
        let dirs = vec![PathBuf::from("/a"), PathBuf::from("/c")];
        assert_eq!(locate(&fs(), "nope", &dirs), None);
        assert_eq!(
            locate(&fs(), "pkg", &dirs),
            Some(Location::Source(PathBuf::from("/c/pkg.sn")))
        );
    }
}
