//! The resolution-chain seam

use super::error::ImportError;
use super::namespace::ModuleRef;
use crate::interpreter::Interpreter;
use std::path::PathBuf;

/// A built module returned to the import system.
///
/// The namespace is already cached and executed; materializing is a lookup.
#[derive(Debug, Clone)]
pub struct ModuleHandle {
    module: ModuleRef,
}

impl ModuleHandle {
    pub fn new(module: ModuleRef) -> Self {
        Self { module }
    }

    pub fn materialize(&self) -> ModuleRef {
        self.module.clone()
    }
}

/// One responder in the module resolution chain.
///
/// `search_path` is the parent package's search path for submodules and
/// `None` for top-level identifiers.
pub trait Finder {
    /// Unique name within one interpreter.
    fn name(&self) -> &str;

    /// `Ok(None)` declines and lets the next finder try.
    fn find_module(
        &self,
        host: &Interpreter,
        id: &str,
        search_path: Option<&[PathBuf]>,
    ) -> Result<Option<ModuleHandle>, ImportError>;
}
