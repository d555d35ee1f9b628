//! Records appended to the hook's destination

use snitch_vfs::VirtualFileSystem;
use std::path::Path;
use tracing::warn;

pub(crate) fn exec_failure(id: &str, message: &str) -> String {
    format!("exec failed in {id} : {message}\n")
}

/// Append `record`; a failed write is logged and otherwise ignored.
pub(crate) fn append(vfs: &dyn VirtualFileSystem, destination: &Path, record: &str) -> bool {
    match vfs.append_file(destination, record.as_bytes()) {
        Ok(()) => true,
        Err(err) => {
            warn!(
                target: "snitch::hook",
                destination = %destination.display(),
                error = %err,
                "cannot write record"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snitch_vfs::MemoryFileSystem;

    #[test]
    fn test_exec_failure_format() {
        assert_eq!(
            exec_failure("pkg.mod", "boom"),
            "exec failed in pkg.mod : boom\n"
        );
    }

    #[test]
    fn test_append_accumulates() {
        let fs = MemoryFileSystem::new();
        let log = Path::new("/logs/hook.log");
        assert!(append(&fs, log, "one\n"));
        assert!(append(&fs, log, "two\n"));
        assert_eq!(fs.read_to_string(log).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_append_failure_is_contained() {
        let fs = MemoryFileSystem::with_files([("/logs/dir/file", "")]);
        assert!(!append(&fs, Path::new("/logs/dir"), "lost\n"));
    }
}
