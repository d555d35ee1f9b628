//! Modules implemented by the host

use super::error::ImportError;
use super::finder::{Finder, ModuleHandle};
use crate::interpreter::Interpreter;
use crate::runtime::stdlib::traceback;
use std::path::PathBuf;

/// Serves modules that have no source file, ahead of every other finder.
#[derive(Debug, Default)]
pub struct BuiltinFinder;

impl BuiltinFinder {
    pub const NAME: &'static str = "builtin";
}

impl Finder for BuiltinFinder {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn find_module(
        &self,
        host: &Interpreter,
        id: &str,
        _search_path: Option<&[PathBuf]>,
    ) -> Result<Option<ModuleHandle>, ImportError> {
        if id != traceback::MODULE_NAME {
            return Ok(None);
        }
        let module = host.modules().get_or_create(id);
        traceback::populate(&module);
        Ok(Some(ModuleHandle::new(module)))
    }
}
