//! The scripting host
//!
//! An `Interpreter` owns everything that lives for the whole run: the file
//! system, the search path, builtins, the module cache and the resolution
//! chain. It is single-threaded; script values are `Rc`-based.

use crate::compiler::parser::{parse, Module};
use crate::import::{Finder, ImportError, ImportSystem, ModuleCache, ModuleRef, ModuleState};
use crate::runtime::bytecode::Code;
use crate::runtime::compiler::compile_module;
use crate::runtime::object::ExceptionRef;
use crate::runtime::stdlib::Builtins;
use crate::runtime::vm::{Unwind, Vm};
use snitch_config::LimitConfig;
use snitch_vfs::{VfsError, VirtualFileSystem};
use std::cell::{Cell, RefCell};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Identifier the entry file runs under.
pub const MAIN_MODULE: &str = "__main__";

/// Why running a program or module did not complete.
#[derive(Debug, Error)]
pub enum ExecError {
    /// An exception no `except` clause caught.
    #[error("{}", .0.summary())]
    Raised(ExceptionRef),
    /// The host could not load or build code.
    #[error(transparent)]
    Fatal(Box<ImportError>),
}

impl From<Unwind> for ExecError {
    fn from(unwind: Unwind) -> Self {
        match unwind {
            Unwind::Raised(exc) => ExecError::Raised(exc),
            Unwind::Fatal(err) => ExecError::Fatal(err),
        }
    }
}

impl From<ImportError> for ExecError {
    fn from(err: ImportError) -> Self {
        ExecError::Fatal(Box::new(err))
    }
}

pub struct Interpreter {
    vfs: Arc<dyn VirtualFileSystem>,
    search_path: RefCell<Vec<PathBuf>>,
    limits: LimitConfig,
    builtins: Builtins,
    imports: ImportSystem,
    stdout: RefCell<Box<dyn Write>>,
    /// Call depth of the innermost VM that started an import.
    depth: Cell<usize>,
}

/// Restores the previous call depth when dropped.
pub struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
    previous: usize,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.previous);
    }
}

impl Interpreter {
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::default()
    }

    /// Native file system, process stdout, default limits.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn vfs(&self) -> &dyn VirtualFileSystem {
        self.vfs.as_ref()
    }

    pub fn search_path(&self) -> Vec<PathBuf> {
        self.search_path.borrow().clone()
    }

    pub fn prepend_search_path(&self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        let mut search_path = self.search_path.borrow_mut();
        search_path.retain(|existing| *existing != dir);
        search_path.insert(0, dir);
    }

    pub fn limits(&self) -> &LimitConfig {
        &self.limits
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn modules(&self) -> &ModuleCache {
        self.imports.cache()
    }

    /// Add a finder to the resolution chain, ahead of the path finder.
    pub fn register_finder(&self, finder: Rc<dyn Finder>) -> Result<(), ImportError> {
        self.imports.register(finder)
    }

    /// Finder names in consultation order.
    pub fn finders(&self) -> Vec<String> {
        self.imports.finder_names()
    }

    pub fn import_module(&self, id: &str) -> Result<ModuleRef, ImportError> {
        self.imports.import(self, id)
    }

    /// Run `code` as the body of `module` on a fresh VM.
    pub fn execute(&self, code: &Rc<Code>, module: &ModuleRef) -> Result<(), ExecError> {
        let mut vm = Vm::new(self);
        vm.run_module(code.clone(), module.clone())?;
        Ok(())
    }

    /// Read a UTF-8 source file.
    pub fn read_source(&self, path: &Path) -> Result<String, ImportError> {
        let bytes = self.vfs.read_file(path).map_err(|source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        String::from_utf8(bytes).map_err(|err| ImportError::Read {
            path: path.to_path_buf(),
            source: VfsError::Custom {
                message: err.to_string(),
            },
        })
    }

    pub fn parse_source(&self, path: &Path, source: &str) -> Result<Module, ImportError> {
        parse(source).map_err(|error| ImportError::Syntax {
            path: path.to_path_buf(),
            error,
        })
    }

    pub fn compile_source(&self, path: &Path, tree: &Module) -> Result<Rc<Code>, ImportError> {
        compile_module(tree, &path.to_string_lossy()).map_err(|source| ImportError::Compile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Run the entry file as `__main__`.
    ///
    /// Its directory goes to the front of the search path. The entry file is
    /// always loaded unpatched.
    #[instrument(target = "snitch::import", skip(self))]
    pub fn run_main(&self, path: &Path) -> Result<ModuleRef, ExecError> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        self.prepend_search_path(dir);

        let source = self.read_source(path)?;
        self.run_code(MAIN_MODULE, path, &source)
    }

    fn run_code(&self, name: &str, path: &Path, source: &str) -> Result<ModuleRef, ExecError> {
        let tree = self.parse_source(path, source)?;
        let code = self.compile_source(path, &tree)?;

        let module = self.modules().get_or_create(name);
        module.set_file(path);
        info!(target: "snitch::vm", module = name, "running");
        match self.execute(&code, &module) {
            Ok(()) => {
                module.set_state(ModuleState::Ready);
                Ok(module)
            }
            Err(err) => {
                module.set_state(ModuleState::Failed);
                debug!(target: "snitch::vm", module = name, error = %err, "module failed");
                Err(err)
            }
        }
    }

    pub fn write_stdout(&self, text: &str) -> std::io::Result<()> {
        let mut out = self.stdout.borrow_mut();
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    pub fn call_depth(&self) -> usize {
        self.depth.get()
    }

    /// Record `depth` as the base for VMs started until the guard drops.
    pub fn enter_call_depth(&self, depth: usize) -> DepthGuard<'_> {
        DepthGuard {
            depth: &self.depth,
            previous: self.depth.replace(depth),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
pub struct InterpreterBuilder {
    vfs: Option<Arc<dyn VirtualFileSystem>>,
    search_path: Vec<PathBuf>,
    limits: LimitConfig,
    stdout: Option<Box<dyn Write>>,
}

impl InterpreterBuilder {
    pub fn vfs(mut self, vfs: Arc<dyn VirtualFileSystem>) -> Self {
        self.vfs = Some(vfs);
        self
    }

    pub fn search_path<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_path = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn limits(mut self, limits: LimitConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Where `print` writes.
    pub fn stdout(mut self, out: Box<dyn Write>) -> Self {
        self.stdout = Some(out);
        self
    }

    pub fn build(self) -> Interpreter {
        Interpreter {
            vfs: self
                .vfs
                .unwrap_or_else(|| Arc::new(snitch_vfs::native_fs())),
            search_path: RefCell::new(self.search_path),
            limits: self.limits,
            builtins: Builtins::new(),
            imports: ImportSystem::new(),
            stdout: RefCell::new(self.stdout.unwrap_or_else(|| Box::new(std::io::stdout()))),
            depth: Cell::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepend_search_path_moves_to_front() {
        let interp = Interpreter::builder().search_path(["/a", "/b"]).build();
        interp.prepend_search_path("/b");
        assert_eq!(
            interp.search_path(),
            vec![PathBuf::from("/b"), PathBuf::from("/a")]
        );
    }

    #[test]
    fn test_depth_guard_restores() {
        let interp = Interpreter::new();
        {
            let _outer = interp.enter_call_depth(3);
            assert_eq!(interp.call_depth(), 3);
            {
                let _inner = interp.enter_call_depth(7);
                assert_eq!(interp.call_depth(), 7);
            }
            assert_eq!(interp.call_depth(), 3);
        }
        assert_eq!(interp.call_depth(), 0);
    }

    #[test]
    fn test_chain_order() {
        let interp = Interpreter::new();
        assert_eq!(
            interp.finders(),
            vec!["builtin".to_string(), "path".to_string()]
        );
    }
}
