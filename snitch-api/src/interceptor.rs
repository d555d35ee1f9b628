//! The module-load hook
//!
//! `ModuleLoadInterceptor` sits in the resolution chain ahead of the path
//! finder. For every identifier that passes its filters it loads the source,
//! instruments each `except` clause and runs the result in place of the
//! original module. Anything it cannot handle is left to the next finder.

use crate::filter::{FilterDecision, FilterSet};
use crate::record;
use snitch_config::HookConfig;
use snitch_core::import::{locate, Location};
use snitch_core::{
    ExecError, Finder, ImportError, Interpreter, LogExceptions, ModuleHandle, ModuleRef,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, trace};

#[derive(Debug)]
pub struct ModuleLoadInterceptor {
    config: HookConfig,
    filters: FilterSet,
    transform: LogExceptions,
}

impl ModuleLoadInterceptor {
    /// Finder name; one interceptor per interpreter.
    pub const NAME: &'static str = "snitch-log-exceptions";

    pub fn new(config: HookConfig) -> Self {
        Self {
            filters: FilterSet::from_config(&config),
            transform: LogExceptions::new(config.log_destination.clone()),
            config,
        }
    }

    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    pub fn destination(&self) -> &Path {
        &self.config.log_destination
    }

    /// Run the filter checks for `id`.
    pub fn matches(&self, id: &str, search_path: Option<&[PathBuf]>) -> FilterDecision {
        self.filters.decide(id, search_path)
    }

    /// Parse, instrument, compile and run `source` as module `id`.
    ///
    /// `Ok(None)` when the module's top-level code raised: a record is
    /// written and the namespace stays cached for the next finder to reuse.
    #[instrument(
        target = "snitch::hook",
        level = "debug",
        skip(self, host, path, source),
        fields(path = %path.display())
    )]
    pub fn build(
        &self,
        host: &Interpreter,
        id: &str,
        path: &Path,
        source: &str,
    ) -> Result<Option<ModuleRef>, ImportError> {
        let mut tree = host.parse_source(path, source)?;
        let stats = self
            .transform
            .visit_module(&mut tree)
            .map_err(|source| ImportError::Template {
                module: id.to_string(),
                source,
            })?;
        trace!(target: "snitch::hook", id, "instrumented source:\n{tree}");
        let code = host.compile_source(path, &tree)?;

        let module = host.modules().get_or_create(id);
        module.set_file(path);

        match host.execute(&code, &module) {
            Ok(()) => {
                info!(
                    target: "snitch::hook",
                    id,
                    handlers = stats.handlers,
                    "loaded instrumented module"
                );
                Ok(Some(module))
            }
            Err(ExecError::Raised(exc)) => {
                debug!(
                    target: "snitch::hook",
                    id,
                    error = %exc.summary(),
                    "instrumented module raised"
                );
                record::append(
                    host.vfs(),
                    self.destination(),
                    &record::exec_failure(id, &exc.message),
                );
                Ok(None)
            }
            Err(ExecError::Fatal(err)) => Err(*err),
        }
    }
}

impl Finder for ModuleLoadInterceptor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn find_module(
        &self,
        host: &Interpreter,
        id: &str,
        search_path: Option<&[PathBuf]>,
    ) -> Result<Option<ModuleHandle>, ImportError> {
        let decision = self.matches(id, search_path);
        if !decision.applies() {
            debug!(target: "snitch::hook", id, %decision, "delegated");
            return Ok(None);
        }

        let leaf = id.rsplit('.').next().unwrap_or(id);
        let location = match search_path {
            Some(dirs) => locate(host.vfs(), leaf, dirs),
            None => locate(host.vfs(), leaf, &host.search_path()),
        };
        let path = match location {
            Some(Location::Source(path)) => path,
            Some(Location::Package { dir, .. }) => {
                debug!(target: "snitch::hook", id, dir = %dir.display(), "package, delegated");
                return Ok(None);
            }
            None => {
                debug!(target: "snitch::hook", id, "source not found, delegated");
                return Ok(None);
            }
        };

        let source = match host.read_source(&path) {
            Ok(source) => source,
            Err(err) => {
                debug!(target: "snitch::hook", id, error = %err, "unreadable, delegated");
                return Ok(None);
            }
        };

        Ok(self.build(host, id, &path, &source)?.map(ModuleHandle::new))
    }
}
