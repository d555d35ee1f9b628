//! 测试辅助工具

#![allow(dead_code)]

use snitch_api::{register, HookConfig, Interpreter, ModuleLoadInterceptor, SnitchError};
use snitch_core::ModuleRef;
use snitch_vfs::MemoryFileSystem;
use std::cell::RefCell;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

pub const LOG: &str = "/logs/caught.log";

#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

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
    out: SharedBuffer,
}

impl Harness {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let fs = Arc::new(MemoryFileSystem::with_files(files.iter().copied()));
        let out = SharedBuffer::default();
        let interp = Interpreter::builder()
            .vfs(fs.clone())
            .search_path(["/app"])
            .stdout(Box::new(out.clone()))
            .build();
        Self { interp, fs, out }
    }

    /// Harness with the hook registered, logging to [`LOG`].
    pub fn hooked(files: &[(&str, &str)], configure: impl FnOnce(&mut HookConfig)) -> Self {
        let harness = Self::new(files);
        let mut config = HookConfig::with_destination(LOG);
        configure(&mut config);
        harness.register(config).unwrap();
        harness
    }

    pub fn register(&self, config: HookConfig) -> Result<Rc<ModuleLoadInterceptor>, SnitchError> {
        register(&self.interp, config)
    }

    pub fn run(&self, entry: &str) -> Result<ModuleRef, SnitchError> {
        snitch_api::run_entry(&self.interp, Path::new(entry))
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.out.0.borrow()).into_owned()
    }

    pub fn log(&self) -> String {
        self.fs.read_to_string(Path::new(LOG)).unwrap_or_default()
    }

    pub fn records(&self) -> usize {
        self.log().matches("New caught error : \n").count()
    }
}

/// A module whose `swallow()` catches a `KeyError` carrying `tag`.
pub fn swallowing_module(tag: &str) -> String {
    format!(
        "fn swallow() {{\n    \
         try {{ raise KeyError(\"{tag}\"); }} except KeyError {{ }}\n    \
         return \"{tag}\";\n}}\n"
    )
}
