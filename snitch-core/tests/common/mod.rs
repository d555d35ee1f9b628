//! 测试辅助工具
//!
//! 内存文件系统 + 捕获 stdout 的解释器

#![allow(dead_code)]

use snitch_core::{ExecError, Interpreter, ModuleRef};
use snitch_vfs::MemoryFileSystem;
use std::cell::RefCell;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

/// `Write` sink whose contents stay readable after the interpreter takes it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Harness {
    pub interp: Interpreter,
    pub fs: Arc<MemoryFileSystem>,
    pub out: SharedBuffer,
}

impl Harness {
    /// Interpreter over an in-memory tree; nothing on the search path until
    /// an entry file runs.
    pub fn new(files: &[(&str, &str)]) -> Self {
        let fs = Arc::new(MemoryFileSystem::with_files(files.iter().copied()));
        let out = SharedBuffer::default();
        let interp = Interpreter::builder()
            .vfs(fs.clone())
            .stdout(Box::new(out.clone()))
            .build();
        Self { interp, fs, out }
    }

    pub fn run(&self, entry: &str) -> Result<ModuleRef, ExecError> {
        self.interp.run_main(Path::new(entry))
    }

    pub fn output(&self) -> String {
        self.out.contents()
    }

    pub fn read(&self, path: &str) -> String {
        self.fs.read_to_string(Path::new(path)).unwrap_or_default()
    }
}

/// Run a single `/app/main.sn` and return what it printed.
pub fn run_code(source: &str) -> Result<String, ExecError> {
    let harness = Harness::new(&[("/app/main.sn", source)]);
    harness.run("/app/main.sn").map(|_| harness.output())
}

/// The kind of exception that escaped, or panic.
pub fn raised_kind(result: Result<String, ExecError>) -> String {
    match result {
        Err(ExecError::Raised(exc)) => exc.kind().to_string(),
        other => panic!("expected a raised exception, got {other:?}"),
    }
}
