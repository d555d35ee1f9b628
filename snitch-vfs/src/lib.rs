//! Snitch Virtual File System
//!
//! A virtual file system abstraction with two backends: the native OS file
//! system and an in-memory one for tests. Every file the interpreter touches
//! (module sources, files opened by scripts, caught-error records) goes
//! through this trait.
//!
//! # Usage
//! ```rust,ignore
//! use snitch_vfs::{VirtualFileSystem, MemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.append_file(Path::new("/caught.log"), b"record\n").unwrap();
//! let content = fs.read_file(Path::new("/caught.log")).unwrap();
//! ```

mod error;
mod memory;
mod native;
mod r#trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use r#trait::VirtualFileSystem;

/// Create a new memory-based file system.
pub fn memory_fs() -> MemoryFileSystem {
    MemoryFileSystem::new()
}

/// Create a new native file system.
pub fn native_fs() -> NativeFileSystem {
    NativeFileSystem::new()
}
