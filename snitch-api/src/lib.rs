//! Snitch API - exception-logging hook and run orchestration
//!
//! Registers a [`ModuleLoadInterceptor`] into an interpreter's resolution
//! chain, so that every module it matches is loaded with a logging block at
//! the top of each `except` clause:
//!
//! ```rust,ignore
//! let host = snitch_api::interpreter(&config, Arc::new(snitch_vfs::native_fs()));
//! snitch_api::register(&host, HookConfig::with_destination("/tmp/caught.log"))?;
//! snitch_api::run_entry(&host, Path::new("app/main.sn"))?;
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod interceptor;
mod record;

pub use config::RunConfig;
pub use error::SnitchError;
pub use filter::{FilterDecision, FilterSet};
pub use interceptor::ModuleLoadInterceptor;

// Re-export config and core types
pub use snitch_config::{HookConfig, LimitConfig, Phase, DEFAULT_LOG_DESTINATION};
pub use snitch_core::{ExecError, ImportError, Interpreter, ModuleRef, Value};

use snitch_vfs::VirtualFileSystem;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use tracing::info;

/// Append the exception-logging hook to `host`'s resolution chain.
///
/// Only modules imported after this call are instrumented.
pub fn register(
    host: &Interpreter,
    config: HookConfig,
) -> Result<Rc<ModuleLoadInterceptor>, SnitchError> {
    let interceptor = Rc::new(ModuleLoadInterceptor::new(config));
    host.register_finder(interceptor.clone())?;
    info!(
        target: "snitch::hook",
        destination = %interceptor.destination().display(),
        include = ?interceptor.config().include,
        exclude = ?interceptor.config().exclude,
        "hook registered"
    );
    Ok(interceptor)
}

/// Interpreter configured from `config`; the hook is not registered.
pub fn interpreter(config: &RunConfig, vfs: Arc<dyn VirtualFileSystem>) -> Interpreter {
    Interpreter::builder()
        .vfs(vfs)
        .search_path(config.search_path.iter().cloned())
        .limits(config.limits.clone())
        .build()
}

/// Run `entry` as `__main__`.
pub fn run_entry(host: &Interpreter, entry: &Path) -> Result<ModuleRef, SnitchError> {
    Ok(host.run_main(entry)?)
}

/// Register the hook on a native-filesystem interpreter and run `entry`.
pub fn run(entry: &Path, config: &RunConfig) -> Result<ModuleRef, SnitchError> {
    let host = interpreter(config, Arc::new(snitch_vfs::native_fs()));
    register(&host, config.hook.clone())?;
    run_entry(&host, entry)
}
