//! Default source loader, last in the chain

use super::error::ImportError;
use super::finder::{Finder, ModuleHandle};
use super::locate::{locate, Location};
use super::namespace::ModuleState;
use crate::interpreter::{ExecError, Interpreter};
use std::path::PathBuf;
use tracing::debug;

/// Loads unmodified source from the search path.
#[derive(Debug, Default)]
pub struct PathFinder;

impl PathFinder {
    pub const NAME: &'static str = "path";
}

impl Finder for PathFinder {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn find_module(
        &self,
        host: &Interpreter,
        id: &str,
        search_path: Option<&[PathBuf]>,
    ) -> Result<Option<ModuleHandle>, ImportError> {
        let leaf = id.rsplit('.').next().unwrap_or(id);
        let location = match search_path {
            Some(dirs) => locate(host.vfs(), leaf, dirs),
            None => locate(host.vfs(), leaf, &host.search_path()),
        };
        let Some(location) = location else {
            return Ok(None);
        };

        let (code, path) = match location.source() {
            Some(path) => {
                let source = host.read_source(path)?;
                let tree = host.parse_source(path, &source)?;
                (Some(host.compile_source(path, &tree)?), Some(path.to_path_buf()))
            }
            None => (None, None),
        };

        // Reuses a namespace left behind by a finder that declined after
        // executing into it.
        let module = host.modules().get_or_create(id);
        if let Location::Package { dir, .. } = &location {
            module.set_search_path(vec![dir.clone()]);
        }
        if let Some(path) = &path {
            module.set_file(path);
        }
        debug!(target: "snitch::import", id, file = ?path, "loading unpatched module");

        if let Some(code) = code {
            match host.execute(&code, &module) {
                Ok(()) => {}
                Err(ExecError::Raised(exception)) => {
                    module.set_state(ModuleState::Failed);
                    return Err(ImportError::Raised {
                        module: id.to_string(),
                        exception,
                    });
                }
                Err(ExecError::Fatal(err)) => {
                    module.set_state(ModuleState::Failed);
                    return Err(*err);
                }
            }
        }
        Ok(Some(ModuleHandle::new(module)))
    }
}
